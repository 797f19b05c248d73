use crate::error::{Error, Result};
use crate::executor::PanicStrategy;

const MAX_WORKERS: usize = 1024;

/// How the crate names and sizes the threads it spawns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadConfig {
    pub name_prefix: String,
    pub stack_size: Option<usize>,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            name_prefix: "futura".to_string(),
            stack_size: Some(2 * 1024 * 1024),
        }
    }
}

impl ThreadConfig {
    pub fn new<S: Into<String>>(name_prefix: S) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            ..Self::default()
        }
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    pub(crate) fn builder(&self, suffix: &str) -> std::thread::Builder {
        let mut builder =
            std::thread::Builder::new().name(format!("{}-{}", self.name_prefix, suffix));
        if let Some(stack_size) = self.stack_size {
            builder = builder.stack_size(stack_size);
        }
        builder
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Persistent workers; `None` means one per logical CPU. Zero leaves
    /// only the queue and, with `allow_exceed`, overflow threads.
    pub workers: Option<usize>,
    /// Jobs that may wait in the queue while every worker is busy.
    pub queue_capacity: usize,
    /// Spawn an ephemeral thread instead of blocking when the queue is full.
    pub allow_exceed: bool,
    pub panic_strategy: PanicStrategy,
    pub thread: ThreadConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: None,
            queue_capacity: 0,
            allow_exceed: false,
            panic_strategy: PanicStrategy::default(),
            thread: ThreadConfig::new("futura-worker"),
        }
    }
}

impl PoolConfig {
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.workers {
            if n > MAX_WORKERS {
                return Err(Error::config(format!(
                    "workers too large (max {})",
                    MAX_WORKERS
                )));
            }
        }

        if self.thread.name_prefix.is_empty() {
            return Err(Error::config("thread name prefix must not be empty"));
        }

        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }
}

#[derive(Debug, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
        }
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.config.workers = Some(n);
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    pub fn allow_exceed(mut self, allow: bool) -> Self {
        self.config.allow_exceed = allow;
        self
    }

    pub fn panic_strategy(mut self, strategy: PanicStrategy) -> Self {
        self.config.panic_strategy = strategy;
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread.name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.thread.stack_size = Some(size);
        self
    }

    pub fn build(self) -> Result<PoolConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
