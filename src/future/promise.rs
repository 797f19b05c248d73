use super::handle::{Future, Wait};
use crate::config::ThreadConfig;
use crate::context::{CancelToken, Context};
use crate::error::Result;
use crate::executor::spawn;
use crate::executor::task::{Task, DETACHED_PANICS};
use std::ops::Deref;

/// A [`Future`] that further computations can be chained onto.
///
/// Each [`then`](Promise::then) starts one thread right away that sleeps until
/// the parent resolves. An error anywhere in the chain skips every later
/// continuation and comes out of the final wait unchanged.
///
/// ```
/// use futura::{Promise, Wait};
///
/// let value = Promise::spawn(|| Ok(20))
///     .then(|v| Ok(v - 10))
///     .then(|v| Ok(v * 3))
///     .then(|v| Ok(v / 5))
///     .wait(None);
/// assert_eq!(value.unwrap(), 6);
/// ```
#[derive(Debug)]
pub struct Promise<T> {
    future: Future<T>,
}

impl<T> Promise<T>
where
    T: Send + Sync + 'static,
{
    pub fn spawn<F>(task: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        Future::spawn(task).into()
    }
}

impl<T> Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Run `continuation` on this promise's value once it is in.
    pub fn then<U, F>(&self, continuation: F) -> Promise<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(T) -> Result<U> + Send + 'static,
    {
        self.then_with(&ThreadConfig::default(), continuation)
    }

    pub fn then_with<U, F>(&self, config: &ThreadConfig, continuation: F) -> Promise<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(T) -> Result<U> + Send + 'static,
    {
        let parent = self.future.clone();
        let (resolver, child) = Future::pending();

        spawn::detached(config, "then", move || {
            let result = match parent.wait(None) {
                Ok(value) => Task::new(move || continuation(value)).run(&DETACHED_PANICS),
                Err(e) => Err(e),
            };
            resolver.resolve(result);
        });

        child.into()
    }

    pub fn future(&self) -> &Future<T> {
        &self.future
    }
}

impl<T: Clone> Wait for Promise<T> {
    type Output = T;

    fn wait(&self, cancel: Option<&CancelToken>) -> Result<T> {
        self.future.wait(cancel)
    }

    fn wait_with_context(&self, ctx: &Context) -> Result<T> {
        self.future.wait_with_context(ctx)
    }
}

impl<T> From<Future<T>> for Promise<T> {
    fn from(future: Future<T>) -> Self {
        Self { future }
    }
}

impl<T> From<Promise<T>> for Future<T> {
    fn from(promise: Promise<T>) -> Self {
        promise.future
    }
}

impl<T> Deref for Promise<T> {
    type Target = Future<T>;

    fn deref(&self) -> &Future<T> {
        &self.future
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            future: self.future.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_then_transforms_value() {
        let p = Promise::spawn(|| {
            thread::sleep(Duration::from_millis(20));
            Ok(42)
        });
        assert_eq!(p.then(|v| Ok(v + 3)).wait(None), Ok(45));
    }

    #[test]
    fn test_then_changes_type() {
        let p = Promise::spawn(|| Ok(7u32)).then(|v| Ok(format!("#{}", v)));
        assert_eq!(p.wait(None), Ok("#7".to_string()));
    }

    #[test]
    fn test_error_short_circuits_chain() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_in_chain = ran.clone();

        let p = Promise::<i32>::spawn(|| Err(Error::task_failed("error!")))
            .then(move |v| {
                ran_in_chain.store(true, Ordering::SeqCst);
                Ok(v + 3)
            })
            .then(|v| Ok(v * 2));

        assert_eq!(p.wait(None), Err(Error::task_failed("error!")));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_continuation_error_is_stored() {
        let p = Promise::spawn(|| Ok(1)).then(|_| -> Result<i32> { Err(Error::task_failed("late")) });
        assert_eq!(p.wait(None), Err(Error::task_failed("late")));
    }

    #[test]
    fn test_continuation_panic_is_stored() {
        let p = Promise::spawn(|| Ok(1)).then(|_| -> Result<i32> { panic!("in then") });
        assert_eq!(p.wait(None), Err(Error::TaskPanicked("in then".to_string())));
    }

    #[test]
    fn test_then_returns_immediately() {
        let start = Instant::now();
        let p = Promise::spawn(|| {
            thread::sleep(Duration::from_millis(100));
            Ok(42)
        });
        let next = p.then(|v| {
            thread::sleep(Duration::from_millis(100));
            Ok(v + 3)
        });
        assert!(start.elapsed() < Duration::from_millis(50));

        assert_eq!(next.wait(None), Ok(45));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(400));
    }

    #[test]
    fn test_parent_still_readable_after_then() {
        let p = Promise::spawn(|| Ok(10));
        let child = p.then(|v| Ok(v * 2));
        assert_eq!(child.wait(None), Ok(20));
        assert_eq!(p.wait(None), Ok(10));
    }
}
