//! Execution queues: how an initialization task actually gets run.
//!
//! The scheduler only ever calls [`ExecutionQueue::enqueue`] and
//! [`ExecutionQueue::wait`]; whether tasks run inline or on a worker pool is
//! decided once per run by which queue it builds.
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::components::error::{Result, SchedulerError};

/// A unit of initialization work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Upper bound on the default worker pool size.
pub const MAX_WORKER_THREADS: usize = 8;

/// Default pool size: one worker per hardware thread, at most
/// [`MAX_WORKER_THREADS`], at least one.
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_WORKER_THREADS)
}

pub trait ExecutionQueue: Send + Sync {
    fn enqueue(&self, task: Task);

    /// Blocks until every task enqueued so far has finished.
    fn wait(&self);
}

/// Runs each task immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialQueue;

impl ExecutionQueue for SerialQueue {
    fn enqueue(&self, task: Task) {
        task();
    }

    fn wait(&self) {}
}

#[derive(Default)]
struct Outstanding {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Outstanding {
    fn increment(&self) {
        *self.count.lock() += 1;
    }

    fn decrement(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }
}

// Decrements on drop so a panicking task is still accounted for
struct TaskGuard<'a>(&'a Outstanding);

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Fixed-size worker pool fed through a channel.
pub struct ConcurrentQueue {
    sender: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
    outstanding: Arc<Outstanding>,
}

impl ConcurrentQueue {
    /// Spawns `threads` workers (at least one), named `stagehand-worker-N`.
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let (sender, receiver) = crossbeam_channel::unbounded::<Task>();
        let outstanding = Arc::new(Outstanding::default());

        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let receiver = receiver.clone();
            let outstanding = Arc::clone(&outstanding);
            let handle = thread::Builder::new()
                .name(format!("stagehand-worker-{index}"))
                .spawn(move || worker_loop(receiver, outstanding))
                .map_err(|source| SchedulerError::WorkerPool { source })?;
            workers.push(handle);
        }
        log::debug!("Started {} initialization worker threads", workers.len());

        Ok(Self {
            sender: Some(sender),
            workers,
            outstanding,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

fn worker_loop(receiver: Receiver<Task>, outstanding: Arc<Outstanding>) {
    for task in receiver.iter() {
        let _guard = TaskGuard(&outstanding);
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            log::error!(
                "Initialization task panicked on {}",
                thread::current().name().unwrap_or("<unnamed>")
            );
        }
    }
}

impl ExecutionQueue for ConcurrentQueue {
    fn enqueue(&self, task: Task) {
        self.outstanding.increment();
        let Some(sender) = &self.sender else {
            self.outstanding.decrement();
            log::warn!("Worker pool is shut down, running task inline");
            task();
            return;
        };
        if let Err(err) = sender.send(task) {
            self.outstanding.decrement();
            log::warn!("Worker pool channel closed, running task inline");
            (err.into_inner())();
        }
    }

    fn wait(&self) {
        let mut count = self.outstanding.count.lock();
        while *count > 0 {
            self.outstanding.idle.wait(&mut count);
        }
    }
}

impl Drop for ConcurrentQueue {
    fn drop(&mut self) {
        // Closing the channel ends every worker loop once the queue drains
        self.sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("Initialization worker thread panicked during shutdown");
            }
        }
    }
}
