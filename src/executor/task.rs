//! Task representation and execution.

use super::panic_handler::{PanicHandler, PanicStrategy};
use crate::error::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::trace;

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Panic handling for tasks that run outside a worker pool.
pub(crate) static DETACHED_PANICS: PanicHandler = PanicHandler::new(PanicStrategy::LogAndContinue);

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A submitted unit of work producing a `T` or an error.
pub(crate) struct Task<T> {
    pub(crate) id: TaskId,
    func: Box<dyn FnOnce() -> Result<T> + Send + 'static>,
    spawn_time: Instant,
}

impl<T> Task<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        Task {
            id: TaskId::next(),
            func: Box::new(f),
            spawn_time: Instant::now(),
        }
    }

    /// Run the body, turning a panic into [`Error::TaskPanicked`](crate::Error::TaskPanicked).
    pub fn run(self, panics: &PanicHandler) -> Result<T> {
        let id = self.id;
        trace!(task = id.0, waited = ?self.spawn_time.elapsed(), "task started");

        let start = Instant::now();
        let result = panics.catch(id, self.func);

        trace!(
            task = id.0,
            elapsed = ?start.elapsed(),
            ok = result.is_ok(),
            "task finished"
        );
        result
    }
}

impl<T> std::fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("spawn_time", &self.spawn_time)
            .finish()
    }
}
