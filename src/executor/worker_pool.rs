use super::launch::Launch;
use super::panic_handler::PanicHandler;
use super::spawn;
use super::task::Task;
use super::worker::{Job, Worker, WorkerId, WorkerState};
use crate::config::{PoolConfig, ThreadConfig};
use crate::error::{Error, Result};
use crate::future::cell::Resolver;
use crate::future::{Future, Wait};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Active,
    /// Stop issued; workers finish the queued jobs and exit.
    Closing,
    /// Every worker has exited.
    Closed,
}

/// Where a submitted job ended up.
enum Admission {
    Queued,
    /// Queue full and the pool may exceed its workers.
    Overflow(Job),
}

/// Fixed set of persistent workers fed from a bounded FIFO queue.
///
/// At most `count()` tasks ever run on pool workers. When the queue is full,
/// [`add_task`](WorkerPool::add_task) either blocks the caller until a worker
/// frees a slot or, with `allow_exceed`, runs the task on an extra throwaway
/// thread that counts towards neither `count()` nor `queue()`.
///
/// A task that blocks on another pool task while the queue is full and every
/// worker is busy deadlocks the pool unless `allow_exceed` is set.
pub struct WorkerPool {
    jobs: RwLock<Option<Sender<Job>>>,
    queue: Receiver<Job>,
    workers: Mutex<Vec<WorkerHandle>>,
    num_workers: usize,
    allow_exceed: bool,
    panics: Arc<PanicHandler>,
    overflow_thread: ThreadConfig,
    overflow_spawned: AtomicUsize,
    // shared with the workers; the last one out marks the pool closed
    state: Arc<Mutex<PoolState>>,
    closer: Mutex<Option<Resolver<()>>>,
    closed: Future<()>,
}

struct WorkerHandle {
    id: WorkerId,
    thread: JoinHandle<()>,
    state: Arc<WorkerState>,
}

impl WorkerPool {
    /// `workers == 0` is accepted. Such a pool never runs queued tasks, so it
    /// is only useful with `allow_exceed`, where every task past the queue
    /// gets its own thread.
    pub fn new(workers: usize, queue_capacity: usize, allow_exceed: bool) -> Result<Self> {
        let config = PoolConfig::builder()
            .workers(workers)
            .queue_capacity(queue_capacity)
            .allow_exceed(allow_exceed)
            .build()?;
        Self::with_config(config)
    }

    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let num_workers = config.worker_threads();
        let (sender, receiver) = bounded(config.queue_capacity);
        let mut handles = Vec::with_capacity(num_workers);
        let state = Arc::new(Mutex::new(PoolState::Active));
        let live = Arc::new(AtomicUsize::new(num_workers));

        for id in 0..num_workers {
            let worker = Worker::new(id);
            let stats = worker.state.clone();
            let jobs = receiver.clone();
            let pool_state = state.clone();
            let live = live.clone();

            let thread = config
                .thread
                .builder(&id.to_string())
                .spawn(move || {
                    worker.run(jobs);
                    if live.fetch_sub(1, Ordering::AcqRel) == 1 {
                        let mut state = pool_state.lock();
                        if *state == PoolState::Closing {
                            *state = PoolState::Closed;
                        }
                    }
                })
                .map_err(|e| Error::spawn(format!("worker {}: {}", id, e)))?;

            handles.push(WorkerHandle {
                id,
                thread,
                state: stats,
            });
        }

        debug!(
            workers = num_workers,
            queue_capacity = config.queue_capacity,
            allow_exceed = config.allow_exceed,
            "worker pool started"
        );

        let (closer, closed) = Future::pending();

        Ok(Self {
            jobs: RwLock::new(Some(sender)),
            queue: receiver,
            workers: Mutex::new(handles),
            num_workers,
            allow_exceed: config.allow_exceed,
            panics: Arc::new(PanicHandler::new(config.panic_strategy)),
            overflow_thread: config.thread.clone(),
            overflow_spawned: AtomicUsize::new(0),
            state,
            closer: Mutex::new(Some(closer)),
            closed,
        })
    }

    /// Submit a task. Returns once the task is queued or handed to an
    /// overflow thread; resolves with [`Error::PoolClosed`] if the pool is
    /// closing.
    pub fn add_task<T, F>(&self, task: F) -> Future<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        // held across a blocking send; `close` waits for it before stopping
        let jobs = self.jobs.read();
        let Some(jobs) = jobs.as_ref() else {
            return Future::ready(Err(Error::PoolClosed));
        };

        let (resolver, future) = Future::pending();
        let task = Task::new(task);
        let id = task.id;
        let panics = self.panics.clone();
        let job = Job::new(id, move || resolver.resolve(task.run(&panics)));

        match self.admit(jobs, job) {
            Admission::Queued => {
                trace!(task = id.as_u64(), queued = self.queue.len(), "task queued");
            }
            Admission::Overflow(job) => {
                let spawned = self.overflow_spawned.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(task = id.as_u64(), spawned, "queue full, running task on overflow thread");
                spawn::detached(&self.overflow_thread, "overflow", move || job.run());
            }
        }

        future
    }

    fn admit(&self, jobs: &Sender<Job>, job: Job) -> Admission {
        if !self.allow_exceed {
            if let Err(e) = jobs.send(job) {
                // cannot happen while `self.queue` keeps the channel open
                error!(task = e.0.task.as_u64(), "job queue disconnected");
            }
            return Admission::Queued;
        }

        match jobs.try_send(job) {
            Ok(()) => Admission::Queued,
            Err(TrySendError::Full(job)) => Admission::Overflow(job),
            Err(TrySendError::Disconnected(job)) => {
                error!(task = job.task.as_u64(), "job queue disconnected");
                Admission::Queued
            }
        }
    }

    /// Stop the pool and wait for every worker to exit.
    ///
    /// Jobs already queued still run. Safe to call repeatedly and from several
    /// threads; every call returns the outcome of the first shutdown.
    ///
    /// Called from inside a pool task, it returns once the other workers have
    /// exited. The calling worker then runs whatever is still queued, and the
    /// pool reaches [`PoolState::Closed`] when it exits. Doing so while another
    /// thread is blocked in `add_task` on a full queue deadlocks.
    pub fn close(&self) -> Result<()> {
        let closer = self.closer.lock().take();
        match closer {
            Some(closer) => {
                let result = self.shutdown();
                closer.resolve(result.clone());
                result
            }
            None => self.closed.wait(None),
        }
    }

    fn shutdown(&self) -> Result<()> {
        *self.state.lock() = PoolState::Closing;
        debug!(workers = self.num_workers, "closing worker pool");

        // workers see the disconnect once the queue is empty
        drop(self.jobs.write().take());

        let workers = std::mem::take(&mut *self.workers.lock());
        let current = thread::current().id();
        let mut first_error = None;
        let mut joined_all = true;

        for worker in workers {
            if worker.thread.thread().id() == current {
                // closed from inside one of our own jobs; this worker drains
                // the rest of the queue once the job returns
                joined_all = false;
                continue;
            }
            match worker.thread.join() {
                Ok(()) => {
                    let executed = worker.state.jobs_executed.load(Ordering::Relaxed);
                    debug!(worker = worker.id, executed, "worker joined");
                }
                Err(_) => {
                    // task bodies run under the panic handler, so only code
                    // around them (logging, result hand-off) can get here
                    error!(worker = worker.id, "worker thread panicked");
                    first_error
                        .get_or_insert_with(|| Error::WorkerPanic(format!("worker {}", worker.id)));
                }
            }
        }

        if joined_all {
            // anything left could not be run; its waiters see `Abandoned`
            let leftover = self.queue.try_iter().count();
            if leftover > 0 {
                error!(leftover, "jobs left in queue after workers stopped");
            }
            *self.state.lock() = PoolState::Closed;
        } else {
            debug!(queued = self.queue.len(), "pool closed from a worker, draining");
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Block until the pool has been closed, by whichever thread.
    pub fn wait(&self) {
        let _ = self.closed.wait(None);
    }

    /// Resolves with the outcome of [`close`](WorkerPool::close) once the pool
    /// has been closed.
    pub fn closed(&self) -> Future<()> {
        self.closed.clone()
    }

    /// Number of persistent workers.
    pub fn count(&self) -> usize {
        self.num_workers
    }

    /// Jobs waiting for a worker.
    pub fn queue(&self) -> usize {
        self.queue.len()
    }

    pub fn state(&self) -> PoolState {
        *self.state.lock()
    }

    /// Throwaway threads started because the queue was full.
    pub fn overflow_spawned(&self) -> usize {
        self.overflow_spawned.load(Ordering::Relaxed)
    }

    /// Task panics caught so far.
    pub fn panic_count(&self) -> usize {
        self.panics.caught()
    }

    pub fn allow_exceed(&self) -> bool {
        self.allow_exceed
    }
}

impl Launch for WorkerPool {
    fn launch<T, F>(&self, task: F) -> Future<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        self.add_task(task)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.num_workers)
            .field("queue", &self.queue())
            .field("allow_exceed", &self.allow_exceed)
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
