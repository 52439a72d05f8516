use std::collections::{LinkedList, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::signal::Signal;

type Job = Box<dyn FnOnce() + Send>;

/// A callback dispatch target.
pub trait Executor: Send + Sync {
    /// Runs `job` at some point, on some thread. No ordering is promised
    /// between distinct submissions.
    fn execute(&self, job: Job);
}

/// Dispatch strategy for completion callbacks: inline or on an executor.
///
/// Channel code never knows which one it got. `Synchronous` keeps tests
/// deterministic but runs arbitrary user code on the caller's stack;
/// `Executor` bounds stack depth under back-to-back rendezvous.
#[derive(Clone)]
pub enum Runner {
    /// Invoke callbacks on the caller's thread, immediately.
    Synchronous,
    /// Submit callbacks to the executor.
    Executor(Arc<dyn Executor>),
}

impl Runner {
    /// Dispatches `job` according to this runner's strategy.
    pub fn run(&self, job: impl FnOnce() + Send + 'static) {
        match self {
            Runner::Synchronous => job(),
            Runner::Executor(executor) => executor.execute(Box::new(job)),
        }
    }

    /// A runner backed by a freshly spawned pool of `workers` threads.
    pub fn pool(workers: usize) -> Self {
        Runner::Executor(Arc::new(ThreadPool::new(workers)))
    }
}

struct PoolShared {
    queue: Mutex<VecDeque<Job>>,
    idle: Mutex<LinkedList<Arc<Signal>>>,
    shutdown: AtomicBool,
}

/// A small fixed-size worker pool implementing [`Executor`].
///
/// Workers park on per-round signals; a submission wakes every idle
/// worker and lets them race for the queue. Dropping the pool shuts the
/// workers down after the jobs already claimed have finished.
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    handles: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl ThreadPool {
    /// Spawns a pool with `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        let shared = Arc::new(PoolShared {
            queue: Mutex::new(VecDeque::new()),
            idle: Mutex::new(LinkedList::new()),
            shutdown: AtomicBool::new(false),
        });

        let mut handles = Vec::new();
        for _ in 0..workers.max(1) {
            let shared = shared.clone();
            handles.push(thread::spawn(move || worker_loop(shared)));
        }

        Self {
            shared,
            handles: Mutex::new(handles),
        }
    }
}

fn worker_loop(shared: Arc<PoolShared>) {
    loop {
        let job = shared.queue.lock().unwrap().pop_front();
        if let Some(job) = job {
            job();
            continue;
        }

        if shared.shutdown.load(Ordering::Acquire) {
            return;
        }

        // Fresh signal per round; abandoned signals are drained (and
        // harmlessly notified) by the next submission.
        let signal = Arc::new(Signal::new());
        shared.idle.lock().unwrap().push_back(signal.clone());

        // Re-check after registering; a job may have landed in between.
        if shared.queue.lock().unwrap().is_empty() && !shared.shutdown.load(Ordering::Acquire) {
            signal.wait();
        }
    }
}

impl Executor for ThreadPool {
    fn execute(&self, job: Job) {
        self.shared.queue.lock().unwrap().push_back(job);
        let mut idle = self.shared.idle.lock().unwrap();
        while let Some(signal) = idle.pop_front() {
            signal.notify();
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        {
            let mut idle = self.shared.idle.lock().unwrap();
            while let Some(signal) = idle.pop_front() {
                signal.notify();
            }
        }
        let handles = std::mem::take(&mut *self.handles.lock().unwrap());
        for handle in handles {
            let _ = handle.join();
        }
    }
}
