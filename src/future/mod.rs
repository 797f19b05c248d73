//! Futures and promises over a write-once result cell.
//!
//! A [`Future`] is a read-only handle; a [`Promise`] adds chaining. Both
//! share the same cell, so any number of handles may wait on one result.

pub(crate) mod cell;
mod handle;
mod promise;

pub use handle::{Future, Wait};
pub use promise::Promise;
