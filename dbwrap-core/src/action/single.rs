use crate::{
    ActionFuture, Connection, Context, Database, DatabaseAction, Driver, Mapper, Query, Result,
    TaskExecutor, log_error,
};
use std::sync::Arc;

/// One query, run on its own connection.
///
/// Every invocation opens a connection, runs the statement, maps the result and closes the
/// connection again, also when any of the previous steps failed.
pub struct SingleDatabaseAction<D: Driver, T> {
    database: Database<D>,
    query: Query,
    mapper: Arc<dyn Mapper<T>>,
    executor: Arc<dyn TaskExecutor>,
}

impl<D: Driver, T> Clone for SingleDatabaseAction<D, T> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            query: self.query.clone(),
            mapper: self.mapper.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<D: Driver, T: Send + 'static> SingleDatabaseAction<D, T> {
    pub fn new(
        database: Database<D>,
        query: Query,
        mapper: Arc<dyn Mapper<T>>,
        executor: Arc<dyn TaskExecutor>,
    ) -> Self {
        Self {
            database,
            query,
            mapper,
            executor,
        }
    }

    pub fn database(&self) -> &Database<D> {
        &self.database
    }

    pub fn statement(&self) -> &Query {
        &self.query
    }

    pub fn mapper(&self) -> &Arc<dyn Mapper<T>> {
        &self.mapper
    }

    /// Type erased handle, the form composite actions take their children in.
    pub fn shared(self) -> Arc<dyn DatabaseAction<D, T>> {
        Arc::new(self)
    }
}

/// Closes `connection`, keeping the first error between `result` and the close failure.
pub(crate) async fn close_after<C: Connection, T>(connection: &mut C, result: Result<T>) -> Result<T> {
    let closed = connection
        .close()
        .await
        .context("While closing the connection");
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(log_error!(e)),
        (Err(e), closed) => {
            if let Err(close) = closed {
                log::error!("{:#}", close);
            }
            Err(e)
        }
    }
}

impl<D: Driver, T: Send + 'static> DatabaseAction<D, T> for SingleDatabaseAction<D, T> {
    fn query(&self) -> ActionFuture<T> {
        let database = self.database.clone();
        let query = self.query.clone();
        let mapper = self.mapper.clone();
        ActionFuture::spawn(&*self.executor, async move {
            let mut connection = database.connect().await?;
            let result = async {
                let table = connection
                    .query_statement(&query)
                    .await
                    .map_err(|e| {
                        log_error!(e.context(format!("While running `{}`", query.printable())))
                    })?;
                mapper.map(table).with_context(|| {
                    format!("While mapping the result of `{}`", query.printable())
                })
            }
            .await;
            close_after(&mut connection, result).await
        })
    }

    fn execute(&self) -> ActionFuture<()> {
        let database = self.database.clone();
        let query = self.query.clone();
        ActionFuture::spawn(&*self.executor, async move {
            let mut connection = database.connect().await?;
            let result = connection
                .execute_statement(&query)
                .await
                .map_err(|e| log_error!(e.context(format!("While running `{}`", query.printable()))));
            close_after(&mut connection, result).await
        })
    }

    fn executor(&self) -> &Arc<dyn TaskExecutor> {
        &self.executor
    }

    fn with_executor(&self, executor: Arc<dyn TaskExecutor>) -> Arc<dyn DatabaseAction<D, T>> {
        Arc::new(Self {
            executor,
            ..self.clone()
        })
    }

    fn as_single(&self) -> Option<&SingleDatabaseAction<D, T>> {
        Some(self)
    }
}
