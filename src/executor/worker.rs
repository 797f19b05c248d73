// persistent pool worker
use super::task::TaskId;
use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

pub type WorkerId = usize;

/// A queued unit of pool work. Running it resolves the task's cell.
pub(crate) struct Job {
    pub(crate) task: TaskId,
    func: Box<dyn FnOnce() + Send + 'static>,
}

impl Job {
    pub fn new<F>(task: TaskId, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            task,
            func: Box::new(f),
        }
    }

    pub fn run(self) {
        (self.func)();
    }
}

// stats shared between a worker and its pool
#[derive(Debug, Default)]
pub struct WorkerState {
    pub jobs_executed: AtomicU64,
}

pub(crate) struct Worker {
    pub id: WorkerId,
    pub state: Arc<WorkerState>,
}

impl Worker {
    pub fn new(id: WorkerId) -> Self {
        Self {
            id,
            state: Arc::new(WorkerState::default()),
        }
    }

    // main loop: runs until the pool drops its sender and the queue is drained
    pub fn run(&self, jobs: Receiver<Job>) {
        debug!(worker = self.id, "worker started");

        for job in jobs.iter() {
            trace!(worker = self.id, task = job.task.as_u64(), "worker picked up job");
            job.run();
            self.state.jobs_executed.fetch_add(1, Ordering::Relaxed);
        }

        debug!(worker = self.id, "worker stopped");
    }
}
