//! Cancellation tokens and wait contexts.
//!
//! Both only ever govern how long a *caller* waits. Nothing here can reach
//! into a running task.

use crate::error::Error;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One-shot cancellation signal shared by any number of waiters.
///
/// Cloning yields another handle to the same signal. Dropping handles never
/// cancels; only [`CancelToken::cancel`] does.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

struct CancelInner {
    // dropped on cancel, which disconnects `rx` for every waiter at once
    tx: Mutex<Option<Sender<()>>>,
    rx: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            inner: Arc::new(CancelInner {
                tx: Mutex::new(Some(tx)),
                rx,
            }),
        }
    }

    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        self.inner.tx.lock().take();
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.tx.lock().is_none()
    }

    /// Block the calling thread until the token is canceled.
    pub fn wait_canceled(&self) {
        let _ = self.inner.rx.recv();
    }

    /// Cancel from a helper thread once `delay` has passed.
    pub fn cancel_after(&self, delay: Duration) {
        let token = self.clone();
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            token.cancel();
        });
    }

    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.inner.rx
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("canceled", &self.is_canceled())
            .finish()
    }
}

/// A cancel token and/or a deadline, whichever fires first.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: Option<CancelToken>,
    deadline: Option<Instant>,
}

impl Context {
    /// Never cancels, has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context together with the token that cancels it.
    pub fn with_cancel() -> (Self, CancelToken) {
        let token = CancelToken::new();
        (Self::background().and_token(token.clone()), token)
    }

    /// A timeout too large to express as an `Instant` means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self::background().and_deadline(deadline)
    }

    pub fn and_token(mut self, token: CancelToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Add a deadline, keeping the earlier one if a deadline is already set.
    pub fn and_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> Option<&CancelToken> {
        self.token.as_ref()
    }

    /// Why this context is done, if it is.
    pub fn err(&self) -> Option<Error> {
        if self.token.as_ref().map_or(false, CancelToken::is_canceled) {
            return Some(Error::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Error::DeadlineExceeded),
            _ => None,
        }
    }
}

impl From<CancelToken> for Context {
    fn from(token: CancelToken) -> Self {
        Self::background().and_token(token)
    }
}
