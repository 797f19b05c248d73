use super::task::TaskId;
use crate::error::{Error, Result};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, warn};

/// What happens when a task body panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanicStrategy {
    /// Abort the process on the first task panic.
    Abort,
    /// Resolve the task with [`Error::TaskPanicked`] without logging.
    Isolate,
    /// Resolve the task with [`Error::TaskPanicked`] and log a warning.
    #[default]
    LogAndContinue,
}

/// Runs task bodies so that a panic becomes the task's error and the thread
/// running them keeps going.
#[derive(Debug)]
pub(crate) struct PanicHandler {
    strategy: PanicStrategy,
    caught: AtomicUsize,
}

impl PanicHandler {
    pub const fn new(strategy: PanicStrategy) -> Self {
        Self {
            strategy,
            caught: AtomicUsize::new(0),
        }
    }

    pub fn catch<T, F>(&self, task: TaskId, body: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let payload = match catch_unwind(AssertUnwindSafe(body)) {
            Ok(result) => return result,
            Err(payload) => payload,
        };
        self.caught.fetch_add(1, Ordering::Relaxed);

        let message = panic_message(payload.as_ref());
        match self.strategy {
            PanicStrategy::Abort => {
                error!(task = task.as_u64(), panic = %message, "task panicked, aborting");
                std::process::abort();
            }
            PanicStrategy::Isolate => {}
            PanicStrategy::LogAndContinue => {
                warn!(task = task.as_u64(), panic = %message, "task panicked");
            }
        }
        Err(Error::TaskPanicked(message))
    }

    /// Panics caught so far.
    pub fn caught(&self) -> usize {
        self.caught.load(Ordering::Relaxed)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return s.to_string();
    }
    payload
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_else(|| "unknown panic".to_string())
}
