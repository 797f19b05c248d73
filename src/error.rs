use std::sync::Arc;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything a wait can hand back besides a value.
///
/// `Canceled` and `DeadlineExceeded` are sentinels: compare them with `==` or
/// `matches!` to tell a given-up wait apart from a failed task.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("wait canceled")]
    Canceled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("task failed: {0}")]
    Task(Arc<dyn std::error::Error + Send + Sync + 'static>),

    #[error("task failed: {0}")]
    TaskFailed(String),

    #[error("task panicked: {0}")]
    TaskPanicked(String),

    /// A pool worker thread died outside any task body, e.g. in a tracing
    /// subscriber or a panic payload's destructor. Reported by `close`.
    #[error("worker panic: {0}")]
    WorkerPanic(String),

    #[error("worker pool is closed")]
    PoolClosed,

    #[error("task dropped before producing a result")]
    Abandoned,

    #[error("failed to spawn thread: {0}")]
    Spawn(String),

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap an arbitrary error returned by a task body.
    pub fn task<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Task(Arc::new(err))
    }

    pub fn task_failed<S: Into<String>>(msg: S) -> Self {
        Error::TaskFailed(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn spawn<S: Into<String>>(msg: S) -> Self {
        Error::Spawn(msg.into())
    }

    /// True for the two errors produced by giving up on a wait rather than by
    /// the task itself.
    pub fn is_wait_interrupted(&self) -> bool {
        matches!(self, Error::Canceled | Error::DeadlineExceeded)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::task(err)
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::Canceled, Error::Canceled)
            | (Error::DeadlineExceeded, Error::DeadlineExceeded)
            | (Error::PoolClosed, Error::PoolClosed)
            | (Error::Abandoned, Error::Abandoned) => true,
            (Error::Task(a), Error::Task(b)) => Arc::ptr_eq(a, b),
            (Error::TaskFailed(a), Error::TaskFailed(b))
            | (Error::TaskPanicked(a), Error::TaskPanicked(b))
            | (Error::WorkerPanic(a), Error::WorkerPanic(b))
            | (Error::Spawn(a), Error::Spawn(b))
            | (Error::Config(a), Error::Config(b)) => a == b,
            _ => false,
        }
    }
}
