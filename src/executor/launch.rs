use crate::config::ThreadConfig;
use crate::error::Result;
use crate::future::Future;

/// Something that turns a task into a [`Future`].
///
/// Implemented by [`Unbounded`], [`Limiter`](super::Limiter) and
/// [`WorkerPool`](super::WorkerPool) so callers can stay generic over how
/// admission is controlled.
pub trait Launch {
    fn launch<T, F>(&self, task: F) -> Future<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T> + Send + 'static;
}

/// Every task gets its own thread immediately.
#[derive(Debug, Clone, Default)]
pub struct Unbounded {
    thread: ThreadConfig,
}

impl Unbounded {
    pub fn new(thread: ThreadConfig) -> Self {
        Self { thread }
    }
}

impl Launch for Unbounded {
    fn launch<T, F>(&self, task: F) -> Future<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        Future::spawn_with(&self.thread, task)
    }
}
