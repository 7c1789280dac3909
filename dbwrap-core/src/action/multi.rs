use crate::{
    ActionFuture, Connection, Context, Database, DatabaseAction, DatabaseError, Driver, Result,
    ServiceSupplier, SingleDatabaseAction, TaskExecutor, log_error,
};
use futures::{StreamExt, stream::FuturesUnordered};
use std::{future::Future, sync::Arc};
use tokio::sync::Mutex;

type SharedConnection<D> = Arc<Mutex<<D as Driver>::Connection>>;

/// Runs a list of child actions and collects their results in input order.
///
/// Each invocation creates its own sub-executor through the service supplier and opens one
/// connection. Leaf children built from the same [`Database`] run their statement on that
/// shared connection, every other child is rebased onto the sub-executor and runs as usual.
/// Once every child settled the connection is closed and the sub-executor shut down, then the
/// result (or the failure of the first failing child in input order) is reported.
pub struct MultiDatabaseAction<D: Driver, B, T> {
    database: Database<D>,
    actions: Arc<[Arc<dyn DatabaseAction<D, B>>]>,
    mapper: Arc<dyn Fn(B) -> T + Send + Sync>,
    executor: Arc<dyn TaskExecutor>,
    service: ServiceSupplier,
}

impl<D: Driver, B, T> Clone for MultiDatabaseAction<D, B, T> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            actions: self.actions.clone(),
            mapper: self.mapper.clone(),
            executor: self.executor.clone(),
            service: self.service.clone(),
        }
    }
}

impl<D, B, T> MultiDatabaseAction<D, B, T>
where
    D: Driver,
    B: Send + 'static,
    T: Send + 'static,
{
    pub fn new(
        database: Database<D>,
        actions: Arc<[Arc<dyn DatabaseAction<D, B>>]>,
        mapper: Arc<dyn Fn(B) -> T + Send + Sync>,
        executor: Arc<dyn TaskExecutor>,
        service: ServiceSupplier,
    ) -> Self {
        Self {
            database,
            actions,
            mapper,
            executor,
            service,
        }
    }

    /// Same action creating its sub-executors with `service`.
    pub fn with_service(self, service: ServiceSupplier) -> Self {
        Self { service, ..self }
    }

    pub fn actions(&self) -> &[Arc<dyn DatabaseAction<D, B>>] {
        &self.actions
    }

    pub fn shared(self) -> Arc<dyn DatabaseAction<D, Vec<T>>> {
        Arc::new(self)
    }

    /// Fans the children out and gathers their outcomes, index by index.
    async fn run<R, L, C>(&self, leaf: L, composite: C) -> Result<Vec<R>>
    where
        R: Send + 'static,
        L: Fn(&SingleDatabaseAction<D, B>, SharedConnection<D>, &dyn TaskExecutor) -> ActionFuture<R>,
        C: Fn(&dyn DatabaseAction<D, B>, Arc<dyn TaskExecutor>) -> ActionFuture<R>,
    {
        let service = (self.service)().context("While creating the executor for the children")?;
        let connection = match self.database.connect().await {
            Ok(connection) => Arc::new(Mutex::new(connection)),
            Err(e) => {
                service.shutdown();
                return Err(e.context("While opening the connection shared by the children"));
            }
        };
        log::trace!("Running {} child actions", self.actions.len());
        let pending = self
            .actions
            .iter()
            .map(|action| match action
                .as_single()
                .filter(|single| single.database().same_source(&self.database))
            {
                Some(single) => leaf(single, connection.clone(), &*service),
                None => composite(&**action, service.clone()),
            })
            .enumerate()
            .map(|(i, future)| async move { (i, future.await) })
            .collect::<FuturesUnordered<_>>();
        let outcomes = gather(self.actions.len(), pending).await;

        let closed = connection
            .lock()
            .await
            .close()
            .await
            .context("While closing the connection shared by the children");
        service.shutdown();

        let mut values = Vec::with_capacity(outcomes.len());
        for (i, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(value) => values.push(value),
                Err(e) => {
                    if let Err(close) = closed {
                        log::error!("{:#}", close);
                    }
                    return Err(e.context(format!("While running the child action {}", i)));
                }
            }
        }
        closed.map_err(|e| log_error!(e))?;
        Ok(values)
    }
}

/// Waits for every future, places each outcome at the index it was tagged with.
async fn gather<R>(
    len: usize,
    mut pending: FuturesUnordered<impl Future<Output = (usize, Result<R>)>>,
) -> Vec<Result<R>> {
    let mut slots: Vec<Option<Result<R>>> = (0..len).map(|_| None).collect();
    while let Some((i, outcome)) = pending.next().await {
        if let Err(e) = &outcome {
            log::debug!("Child action {} failed: {:#}", i, e);
        }
        slots[i] = Some(outcome);
    }
    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err(DatabaseError::Abandoned.into())))
        .collect()
}

impl<D, B, T> DatabaseAction<D, Vec<T>> for MultiDatabaseAction<D, B, T>
where
    D: Driver,
    B: Send + 'static,
    T: Send + 'static,
{
    fn query(&self) -> ActionFuture<Vec<T>> {
        let this = self.clone();
        ActionFuture::spawn(&*self.executor, async move {
            let values = this
                .run(
                    |single: &SingleDatabaseAction<D, B>,
                     connection: SharedConnection<D>,
                     service: &dyn TaskExecutor| {
                        let query = single.statement().clone();
                        let mapper = single.mapper().clone();
                        ActionFuture::spawn(service, async move {
                            let table = {
                                let mut connection = connection.lock().await;
                                connection.query_statement(&query).await.map_err(|e| {
                                    log_error!(
                                        e.context(format!("While running `{}`", query.printable()))
                                    )
                                })?
                            };
                            mapper.map(table).with_context(|| {
                                format!("While mapping the result of `{}`", query.printable())
                            })
                        })
                    },
                    |action: &dyn DatabaseAction<D, B>, service: Arc<dyn TaskExecutor>| {
                        action.with_executor(service).query()
                    },
                )
                .await?;
            Ok(values.into_iter().map(|v| (this.mapper)(v)).collect())
        })
    }

    fn execute(&self) -> ActionFuture<()> {
        let this = self.clone();
        ActionFuture::spawn(&*self.executor, async move {
            this.run(
                |single: &SingleDatabaseAction<D, B>,
                 connection: SharedConnection<D>,
                 service: &dyn TaskExecutor| {
                    let query = single.statement().clone();
                    ActionFuture::spawn(service, async move {
                        let mut connection = connection.lock().await;
                        connection.execute_statement(&query).await.map_err(|e| {
                            log_error!(e.context(format!("While running `{}`", query.printable())))
                        })
                    })
                },
                |action: &dyn DatabaseAction<D, B>, service: Arc<dyn TaskExecutor>| {
                    action.with_executor(service).execute()
                },
            )
            .await?;
            Ok(())
        })
    }

    fn executor(&self) -> &Arc<dyn TaskExecutor> {
        &self.executor
    }

    fn with_executor(
        &self,
        executor: Arc<dyn TaskExecutor>,
    ) -> Arc<dyn DatabaseAction<D, Vec<T>>> {
        Arc::new(Self {
            executor,
            ..self.clone()
        })
    }
}
