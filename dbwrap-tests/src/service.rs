use dbwrap::{Result, ServiceSupplier, Task, TaskExecutor, WorkerPool};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

#[derive(Debug, Default)]
struct Counters {
    created: AtomicUsize,
    tasks: AtomicUsize,
    shutdowns: AtomicUsize,
}

/// Hands out worker pools to composite actions and counts what happens to them.
#[derive(Debug, Clone, Default)]
pub struct ServiceRecorder {
    counters: Arc<Counters>,
}

impl ServiceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A supplier creating pools of `workers` workers.
    pub fn supplier(&self, workers: usize) -> ServiceSupplier {
        let counters = self.counters.clone();
        Arc::new(move || -> Result<Arc<dyn TaskExecutor>> {
            counters.created.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(RecordingService {
                pool: WorkerPool::new(workers)?,
                counters: counters.clone(),
            }) as Arc<dyn TaskExecutor>)
        })
    }

    /// Number of services created.
    pub fn created(&self) -> usize {
        self.counters.created.load(Ordering::SeqCst)
    }

    /// Number of tasks accepted by all the services.
    pub fn tasks(&self) -> usize {
        self.counters.tasks.load(Ordering::SeqCst)
    }

    /// Number of shutdown calls received by all the services.
    pub fn shutdowns(&self) -> usize {
        self.counters.shutdowns.load(Ordering::SeqCst)
    }
}

/// A [`WorkerPool`] reporting to a [`ServiceRecorder`].
pub struct RecordingService {
    pool: WorkerPool,
    counters: Arc<Counters>,
}

impl TaskExecutor for RecordingService {
    fn execute(&self, task: Task) -> Result<()> {
        self.pool.execute(task)?;
        self.counters.tasks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn shutdown(&self) {
        self.counters.shutdowns.fetch_add(1, Ordering::SeqCst);
        self.pool.shutdown();
    }
}
