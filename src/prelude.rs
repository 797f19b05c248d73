pub use crate::config::{PoolConfig, PoolConfigBuilder, ThreadConfig};
pub use crate::context::{CancelToken, Context};
pub use crate::error::{Error, Result};
pub use crate::executor::{Launch, Limiter, PanicStrategy, PoolState, Unbounded, WorkerPool};
pub use crate::future::{Future, Promise, Wait};
