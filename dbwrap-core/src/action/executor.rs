use crate::{DatabaseError, Result};
use futures::{FutureExt, future::BoxFuture};
use std::{
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::runtime::Handle;

/// Unit of work submitted to a [`TaskExecutor`].
pub type Task = BoxFuture<'static, ()>;

/// Execution context running the body of an action.
pub trait TaskExecutor: Send + Sync {
    /// Schedules `task`, fails with [`DatabaseError::Rejected`] when it cannot be accepted.
    fn execute(&self, task: Task) -> Result<()>;

    /// Stops accepting new tasks, the ones already accepted still run to completion.
    fn shutdown(&self) {}
}

impl<E: TaskExecutor + ?Sized> TaskExecutor for Arc<E> {
    fn execute(&self, task: Task) -> Result<()> {
        (**self).execute(task)
    }
    fn shutdown(&self) {
        (**self).shutdown()
    }
}

/// Produces the sub-executor a composite action runs its children on, one per invocation.
pub type ServiceSupplier = Arc<dyn Fn() -> Result<Arc<dyn TaskExecutor>> + Send + Sync>;

/// The supplier used when none is configured: a pool with a single worker.
pub fn default_service() -> ServiceSupplier {
    Arc::new(|| -> Result<Arc<dyn TaskExecutor>> { Ok(Arc::new(WorkerPool::single()?)) })
}

fn runtime_handle(handle: Option<&Handle>) -> Result<Handle> {
    match handle {
        Some(handle) => Ok(handle.clone()),
        None => Handle::try_current().map_err(|e| {
            DatabaseError::Rejected(format!("there is no tokio runtime to run the task on: {e}"))
                .into()
        }),
    }
}

/// Spawns a new tokio task for every submission.
///
/// Without an explicit handle it uses the runtime of the thread that submits the task.
#[derive(Debug, Clone, Default)]
pub struct SpawnExecutor {
    handle: Option<Handle>,
}

impl SpawnExecutor {
    pub fn new() -> Self {
        Self::default()
    }
    /// Spawns on the runtime of `handle`, also when submitting from outside of it.
    pub fn on(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }
}

impl TaskExecutor for SpawnExecutor {
    fn execute(&self, task: Task) -> Result<()> {
        runtime_handle(self.handle.as_ref())?.spawn(task);
        Ok(())
    }
}

/// A fixed number of workers draining a shared queue.
///
/// Each worker runs one task at a time, so `WorkerPool::single()` runs its tasks one after the
/// other in submission order.
pub struct WorkerPool {
    sender: Mutex<Option<flume::Sender<Task>>>,
    workers: usize,
}

impl WorkerPool {
    /// Starts `workers` workers (at least one) on the current tokio runtime.
    pub fn new(workers: usize) -> Result<Self> {
        Self::with_handle(workers, &runtime_handle(None)?)
    }

    pub fn single() -> Result<Self> {
        Self::new(1)
    }

    pub fn with_handle(workers: usize, handle: &Handle) -> Result<Self> {
        let workers = workers.max(1);
        let (sender, receiver) = flume::unbounded::<Task>();
        for worker in 0..workers {
            let receiver = receiver.clone();
            handle.spawn(async move {
                while let Ok(task) = receiver.recv_async().await {
                    if AssertUnwindSafe(task).catch_unwind().await.is_err() {
                        log::error!("A task panicked on the worker {}", worker);
                    }
                }
                log::trace!("Worker {} stopped", worker);
            });
        }
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn is_shutdown(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl TaskExecutor for WorkerPool {
    fn execute(&self, task: Task) -> Result<()> {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = sender.as_ref() else {
            return Err(DatabaseError::Rejected("the worker pool was shut down".into()).into());
        };
        sender
            .send(task)
            .map_err(|_| DatabaseError::Rejected("the worker pool stopped".into()).into())
    }

    fn shutdown(&self) {
        if self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
        {
            log::debug!("Shutting down a worker pool of {} workers", self.workers);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TaskExecutor, WorkerPool};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn pool_drains_after_shutdown() {
        let pool = WorkerPool::single().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel();
        for _ in 0..3 {
            let counter = counter.clone();
            pool.execute(Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        }
        pool.execute(Box::pin(async move {
            let _ = tx.send(());
        }))
        .unwrap();
        pool.shutdown();
        assert!(pool.is_shutdown());
        assert!(pool.execute(Box::pin(async {})).is_err());
        rx.await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn pool_outside_runtime() {
        assert!(WorkerPool::single().is_err());
    }
}
