use super::cell::{self, ResultCell, Resolver};
use crate::config::ThreadConfig;
use crate::context::{CancelToken, Context};
use crate::error::{Error, Result};
use crate::executor::spawn;
use crate::executor::task::{Task, DETACHED_PANICS};
use crossbeam_channel::{at, never, select};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Blocking reads of an eventual result.
///
/// Waiting is idempotent: once the result is in, every call returns a clone
/// of it. Giving up on a wait (`Canceled`, `DeadlineExceeded`) leaves the task
/// running; a later wait still sees its real result.
///
/// If the result and the cancellation become ready at the same moment, either
/// may be returned.
pub trait Wait {
    type Output;

    /// Wait until the result is in or `cancel` fires. `None` waits forever.
    fn wait(&self, cancel: Option<&CancelToken>) -> Result<Self::Output>;

    /// Wait until the result is in or the context's token or deadline fires,
    /// returning the context's own error in the latter case.
    fn wait_with_context(&self, ctx: &Context) -> Result<Self::Output>;

    fn wait_timeout(&self, timeout: Duration) -> Result<Self::Output> {
        self.wait_with_context(&Context::with_timeout(timeout))
    }

    fn wait_deadline(&self, deadline: Instant) -> Result<Self::Output> {
        self.wait_with_context(&Context::with_deadline(deadline))
    }
}

/// Handle to the result of a task running elsewhere.
///
/// ```
/// use futura::{Future, Wait};
///
/// let f = Future::spawn(|| Ok(6 * 7));
/// assert_eq!(f.wait(None).unwrap(), 42);
/// ```
pub struct Future<T> {
    pub(crate) cell: Arc<ResultCell<T>>,
}

impl<T> Future<T> {
    /// An unresolved future and the only way to resolve it.
    pub(crate) fn pending() -> (Resolver<T>, Self) {
        let (resolver, cell) = cell::pair();
        (resolver, Self { cell })
    }

    /// An already-resolved future.
    pub fn ready(result: Result<T>) -> Self {
        let (resolver, future) = Self::pending();
        resolver.resolve(result);
        future
    }

    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Future<T>
where
    T: Send + Sync + 'static,
{
    /// Run `task` on a new thread.
    pub fn spawn<F>(task: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        Self::spawn_with(&ThreadConfig::default(), task)
    }

    pub fn spawn_with<F>(config: &ThreadConfig, task: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (resolver, future) = Self::pending();
        let task = Task::new(task);
        spawn::detached(config, "task", move || {
            resolver.resolve(task.run(&DETACHED_PANICS));
        });
        future
    }
}

impl<T: Clone> Future<T> {
    /// The result if it is already in, without blocking.
    pub fn try_get(&self) -> Option<Result<T>> {
        self.cell.get().cloned()
    }
}

impl<T: Clone> Wait for Future<T> {
    type Output = T;

    fn wait(&self, cancel: Option<&CancelToken>) -> Result<T> {
        let idle = never();
        let cancel = cancel.map_or(&idle, CancelToken::receiver);

        select! {
            recv(self.cell.done()) -> _ => self.cell.outcome(),
            recv(cancel) -> _ => Err(Error::Canceled),
        }
    }

    fn wait_with_context(&self, ctx: &Context) -> Result<T> {
        let idle = never();
        let cancel = ctx.token().map_or(&idle, CancelToken::receiver);
        let deadline = ctx.deadline().map_or_else(never, at);

        select! {
            recv(self.cell.done()) -> _ => self.cell.outcome(),
            recv(cancel) -> _ => Err(Error::Canceled),
            recv(deadline) -> _ => Err(Error::DeadlineExceeded),
        }
    }
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_wait_returns_value() {
        let f = Future::spawn(|| {
            thread::sleep(Duration::from_millis(10));
            Ok(42)
        });
        assert_eq!(f.wait(None), Ok(42));
        assert!(f.is_ready());
    }

    #[test]
    fn test_wait_is_idempotent() {
        let f = Future::spawn(|| Ok(vec![1, 2, 3]));
        let copy = f.clone();
        assert_eq!(f.wait(None), Ok(vec![1, 2, 3]));
        assert_eq!(f.wait(None), Ok(vec![1, 2, 3]));
        assert_eq!(copy.wait_timeout(Duration::from_millis(1)), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn test_wait_timeout_max_waits_for_result() {
        let f = Future::spawn(|| {
            thread::sleep(Duration::from_millis(10));
            Ok(1)
        });
        assert_eq!(f.wait_timeout(Duration::MAX), Ok(1));
    }

    #[test]
    fn test_try_get_before_and_after() {
        let gate = CancelToken::new();
        let release = gate.clone();
        let f = Future::spawn(move || {
            let _ = gate.receiver().recv();
            Ok("done")
        });

        assert!(f.try_get().is_none());
        release.cancel();
        assert_eq!(f.wait(None), Ok("done"));
        assert_eq!(f.try_get(), Some(Ok("done")));
    }

    #[test]
    fn test_ready_future() {
        let f: Future<u8> = Future::ready(Err(Error::PoolClosed));
        assert!(f.is_ready());
        assert_eq!(f.wait(None), Err(Error::PoolClosed));
    }

    #[test]
    fn test_precanceled_token_on_pending_future() {
        let token = CancelToken::new();
        token.cancel();
        let f = Future::spawn(|| {
            thread::sleep(Duration::from_millis(200));
            Ok(1)
        });
        assert_eq!(f.wait(Some(&token)), Err(Error::Canceled));
    }

    #[test]
    fn test_panicking_task_resolves_with_error() {
        let f: Future<i32> = Future::spawn(|| panic!("kaput"));
        assert_eq!(f.wait(None), Err(Error::TaskPanicked("kaput".to_string())));
    }

    #[test]
    fn test_spawn_with_names_thread() {
        let f = Future::spawn_with(&ThreadConfig::new("probe"), || {
            Ok(thread::current().name().map(str::to_owned))
        });
        assert_eq!(f.wait(None), Ok(Some("probe-task".to_string())));
    }
}
