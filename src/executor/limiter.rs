//! Admission control for directly spawned tasks.

use super::launch::Launch;
use super::spawn;
use super::task::{Task, DETACHED_PANICS};
use crate::config::ThreadConfig;
use crate::error::Result;
use crate::future::Future;
use crate::util::AdmissionGate;
use std::sync::Arc;
use tracing::trace;

/// Caps how many task bodies run at the same time.
///
/// Admission happens on the submitting thread: [`add_task`](Limiter::add_task)
/// blocks while every slot is taken, in arrival order, and returns as soon as
/// the task has a slot and a thread. The slot is given back when the body
/// finishes, whatever its outcome.
#[derive(Debug)]
pub struct Limiter {
    gate: Option<Arc<AdmissionGate>>,
    thread: ThreadConfig,
}

impl Limiter {
    /// `max_concurrent == 0` means no limit at all.
    pub fn new(max_concurrent: usize) -> Self {
        Self::with_thread_config(max_concurrent, ThreadConfig::default())
    }

    pub fn with_thread_config(max_concurrent: usize, thread: ThreadConfig) -> Self {
        let gate = (max_concurrent > 0).then(|| Arc::new(AdmissionGate::new(max_concurrent)));
        Self { gate, thread }
    }

    pub fn add_task<T, F>(&self, task: F) -> Future<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let Some(gate) = &self.gate else {
            return Future::spawn_with(&self.thread, task);
        };

        let permit = gate.acquire();
        let task = Task::new(task);
        trace!(task = task.id.as_u64(), in_flight = gate.in_flight(), "task admitted");

        let (resolver, future) = Future::pending();
        spawn::detached(&self.thread, "limited", move || {
            let result = task.run(&DETACHED_PANICS);
            // free the slot before waking waiters on the result
            drop(permit);
            resolver.resolve(result);
        });
        future
    }

    /// Configured capacity; 0 when unlimited.
    pub fn count(&self) -> usize {
        self.gate.as_ref().map_or(0, |gate| gate.capacity())
    }

    /// Slots currently taken; never more than [`count`](Self::count).
    pub fn queue(&self) -> usize {
        self.gate.as_ref().map_or(0, |gate| gate.in_flight())
    }

    /// Submitters currently blocked waiting for a slot.
    pub fn waiting(&self) -> usize {
        self.gate.as_ref().map_or(0, |gate| gate.waiting())
    }
}

impl Launch for Limiter {
    fn launch<T, F>(&self, task: F) -> Future<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        self.add_task(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancelToken;
    use crate::error::Error;
    use crate::future::Wait;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_limiter_empty() {
        let l = Limiter::new(10);

        assert_eq!(l.count(), 10);
        assert_eq!(l.queue(), 0);
    }

    #[test]
    fn test_unlimited() {
        let l = Limiter::new(0);
        let futures: Vec<_> = (0..5).map(|i| l.add_task(move || Ok(i))).collect();

        assert_eq!(l.count(), 0);
        assert_eq!(l.queue(), 0);
        for (i, f) in futures.iter().enumerate() {
            assert_eq!(f.wait(None), Ok(i));
        }
    }

    #[test]
    fn test_thread_names() {
        let name = || Ok(thread::current().name().map(str::to_owned));

        let limited = Limiter::new(1).add_task(name).wait(None);
        assert_eq!(limited, Ok(Some("futura-limited".to_string())));

        let unlimited = Limiter::new(0).add_task(name).wait(None);
        assert_eq!(unlimited, Ok(Some("futura-task".to_string())));
    }

    #[test]
    fn test_limiter_add_tasks() {
        let l = Arc::new(Limiter::new(10));
        let gate = CancelToken::new();

        let f1 = {
            let gate = gate.clone();
            l.add_task(move || {
                let _ = gate.receiver().recv();
                Ok(100)
            })
        };
        assert_eq!(l.queue(), 1);

        let f2 = {
            let f1 = f1.clone();
            l.add_task(move || f1.wait(None))
        };
        assert_eq!(l.count(), 10);
        assert_eq!(l.queue(), 2);

        gate.cancel();
        assert_eq!(f2.wait(None), Ok(100));
        assert_eq!(f1.wait(None), Ok(100));
        assert_eq!(l.queue(), 0);
    }

    #[test]
    fn test_slot_released_on_error_and_panic() {
        let l = Limiter::new(1);

        let failed: Future<i32> = l.add_task(|| Err(Error::task_failed("no")));
        assert_eq!(failed.wait(None), Err(Error::task_failed("no")));
        assert_eq!(l.queue(), 0);

        let panicked: Future<i32> = l.add_task(|| panic!("no"));
        assert!(matches!(panicked.wait(None), Err(Error::TaskPanicked(_))));
        assert_eq!(l.queue(), 0);

        assert_eq!(l.add_task(|| Ok(1)).wait(None), Ok(1));
    }

    #[test]
    fn test_saturated_submitter_blocks() {
        let l = Arc::new(Limiter::new(1));
        let gate = CancelToken::new();

        let first = {
            let gate = gate.clone();
            l.add_task(move || {
                let _ = gate.receiver().recv();
                Ok(1)
            })
        };

        let submitter = {
            let l = l.clone();
            thread::spawn(move || l.add_task(|| Ok(2)).wait(None))
        };

        while l.waiting() == 0 {
            thread::yield_now();
        }
        thread::sleep(Duration::from_millis(20));
        assert!(!submitter.is_finished());
        assert_eq!(l.queue(), 1);

        gate.cancel();
        assert_eq!(submitter.join().unwrap(), Ok(2));
        assert_eq!(first.wait(None), Ok(1));
    }
}
