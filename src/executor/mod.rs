//! Task launchers.
//!
//! Three ways to turn a task into a [`Future`](crate::Future): spawn it
//! right away ([`Unbounded`]), gate it behind a concurrency cap
//! ([`Limiter`]), or queue it for a fixed set of workers ([`WorkerPool`]).

pub mod launch;
pub mod limiter;
mod panic_handler;
pub(crate) mod spawn;
pub mod task;
pub mod worker;
pub mod worker_pool;

pub use launch::{Launch, Unbounded};
pub use limiter::Limiter;
pub use panic_handler::PanicStrategy;
pub use task::TaskId;
pub use worker_pool::{PoolState, WorkerPool};
