//! Futura - blocking futures, promise chains and bounded task launchers.
//!
//! Every task runs on a real thread; waiting on its result blocks the caller
//! until the result is in, a [`CancelToken`] fires, or a deadline passes.
//! Giving up on a wait never interrupts the task itself.
//!
//! # Quick Start
//!
//! ```
//! use futura::prelude::*;
//! use std::time::Duration;
//!
//! // Run something on its own thread
//! let answer = Future::spawn(|| Ok(42));
//! assert_eq!(answer.wait(None).unwrap(), 42);
//!
//! // Chain work onto a result
//! let label = Promise::spawn(|| Ok(20))
//!     .then(|v| Ok(v / 2))
//!     .then(|v| Ok(format!("got {}", v)));
//! assert_eq!(label.wait_timeout(Duration::from_secs(1)).unwrap(), "got 10");
//!
//! // Bound concurrency
//! let pool = WorkerPool::new(2, 8, false).unwrap();
//! let f = pool.add_task(|| Ok("from a worker"));
//! assert_eq!(f.wait(None).unwrap(), "from a worker");
//! pool.close().unwrap();
//! ```
//!
//! # Launchers
//!
//! - [`Future::spawn`] / [`Promise::spawn`]: a new thread per task
//! - [`Limiter`]: at most N task bodies at once, admission blocks the caller
//! - [`WorkerPool`]: fixed workers, bounded queue, optional overflow threads

#![warn(missing_debug_implementations)]

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod future;
pub mod prelude;
pub mod util;

// Re-export key types at crate root
pub use config::{PoolConfig, PoolConfigBuilder, ThreadConfig};
pub use context::{CancelToken, Context};
pub use error::{Error, Result};
pub use executor::{Launch, Limiter, PanicStrategy, PoolState, Unbounded, WorkerPool};
pub use future::{Future, Promise, Wait};
