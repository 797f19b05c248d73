//! Write-once result slot with a broadcast completion signal.

use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::{Arc, OnceLock};

/// Storage behind every [`Future`](super::Future).
///
/// `slot` is written exactly once, strictly before `done` disconnects. A
/// reader that saw `done` disconnect can read `slot` without further locking.
pub(crate) struct ResultCell<T> {
    slot: OnceLock<Result<T>>,
    done: Receiver<()>,
}

impl<T> ResultCell<T> {
    /// Fires (disconnects) once the result is in place. Nothing is ever sent.
    pub(crate) fn done(&self) -> &Receiver<()> {
        &self.done
    }

    pub(crate) fn get(&self) -> Option<&Result<T>> {
        self.slot.get()
    }
}

impl<T: Clone> ResultCell<T> {
    /// Clone the stored result. Only meaningful after `done` fired.
    pub(crate) fn outcome(&self) -> Result<T> {
        self.slot.get().cloned().unwrap_or(Err(Error::Abandoned))
    }
}

/// The single write capability for a [`ResultCell`].
///
/// Dropping it unresolved still completes the cell, with
/// [`Error::Abandoned`].
pub(crate) struct Resolver<T> {
    cell: Arc<ResultCell<T>>,
    signal: Option<Sender<()>>,
}

impl<T> Resolver<T> {
    pub(crate) fn resolve(mut self, result: Result<T>) {
        self.complete(result);
    }

    fn complete(&mut self, result: Result<T>) {
        if let Some(signal) = self.signal.take() {
            let _ = self.cell.slot.set(result);
            drop(signal);
        }
    }
}

impl<T> Drop for Resolver<T> {
    fn drop(&mut self) {
        self.complete(Err(Error::Abandoned));
    }
}

/// A fresh, unresolved cell and its writer.
pub(crate) fn pair<T>() -> (Resolver<T>, Arc<ResultCell<T>>) {
    let (signal, done) = bounded(0);
    let cell = Arc::new(ResultCell {
        slot: OnceLock::new(),
        done,
    });
    let resolver = Resolver {
        cell: cell.clone(),
        signal: Some(signal),
    };
    (resolver, cell)
}
