use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Wake, Waker};

use crate::error::Error;
use crate::promise::Promise;
use crate::runner::Runner;

const IDLE: u8 = 0;
const POLLING: u8 = 1;
const REPOLL: u8 = 2;

/// Serializes polls of a single body future and coalesces wakeups.
///
/// At most one thread holds the gate in `Polling`; a wake arriving while
/// a poll is in flight flags a repoll instead of polling concurrently,
/// and the polling thread loops until no wake was lost.
pub struct PollGate {
    state: AtomicU8,
}

impl Default for PollGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PollGate {
    /// Creates an idle gate.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
        }
    }

    /// Attempts to become the polling thread. On failure the in-flight
    /// poller is flagged to poll again, so the wakeup is never lost.
    pub fn try_begin(&self) -> bool {
        loop {
            match self
                .state
                .compare_exchange(IDLE, POLLING, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return true,
                Err(POLLING) => {
                    if self
                        .state
                        .compare_exchange(POLLING, REPOLL, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return false;
                    }
                    // Raced with the poller finishing; retry from the top.
                }
                Err(_) => return false,
            }
        }
    }

    /// Ends a polling round. Returns true when a wake arrived mid-poll
    /// and the caller must poll once more.
    pub fn finish(&self) -> bool {
        match self
            .state
            .compare_exchange(POLLING, IDLE, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => false,
            Err(_) => {
                self.state.store(POLLING, Ordering::Release);
                true
            }
        }
    }
}

type Body<T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send>>;

/// Drives one coroutine body and plumbs its outcome into a promise.
struct Controller<T: Send + Sync + 'static> {
    body: Mutex<Option<Body<T>>>,
    gate: PollGate,
    result: Promise<T>,
}

impl<T: Send + Sync + 'static> Controller<T> {
    fn new(body: impl Future<Output = Result<T, Error>> + Send + 'static) -> Arc<Self> {
        Arc::new(Self {
            body: Mutex::new(Some(Box::pin(body))),
            gate: PollGate::new(),
            result: Promise::new(),
        })
    }
}

fn resume<T: Send + Sync + 'static>(controller: &Arc<Controller<T>>) {
    if !controller.gate.try_begin() {
        return;
    }
    loop {
        poll_once(controller);
        if !controller.gate.finish() {
            return;
        }
    }
}

fn poll_once<T: Send + Sync + 'static>(controller: &Arc<Controller<T>>) {
    let mut slot = controller.body.lock().unwrap();
    let Some(body) = slot.as_mut() else { return };
    let waker = Waker::from(controller.clone());
    let mut cx = Context::from_waker(&waker);
    match body.as_mut().poll(&mut cx) {
        Poll::Ready(outcome) => {
            *slot = None;
            drop(slot);
            match outcome {
                Ok(value) => {
                    controller.result.complete(value);
                }
                Err(error) => {
                    controller.result.complete_exceptionally(error);
                }
            }
        }
        Poll::Pending => {}
    }
}

impl<T: Send + Sync + 'static> Wake for Controller<T> {
    fn wake(self: Arc<Self>) {
        resume(&self);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        resume(self);
    }
}

/// Runs a coroutine body to a promise.
///
/// The body starts inline on the caller's thread and runs until its
/// first suspension; after each awaited promise settles, resumption
/// continues on the settling thread. The returned promise completes
/// with the body's `Ok` value or fails with its `Err`.
///
/// ```
/// use randevu::{Promise, run_async};
///
/// let answer = Promise::completed(21);
/// let doubled = run_async(async move { Ok(answer.await? * 2) });
/// assert_eq!(doubled.get(), Ok(42));
/// ```
pub fn run_async<T, F>(body: F) -> Promise<T>
where
    T: Send + Sync + 'static,
    F: Future<Output = Result<T, Error>> + Send + 'static,
{
    let controller = Controller::new(body);
    let result = controller.result.clone();
    resume(&controller);
    result
}

/// Like [`run_async`], but the body's first resumption is dispatched
/// through `runner` instead of running on the caller's stack.
pub fn spawn_async<T, F>(runner: &Runner, body: F) -> Promise<T>
where
    T: Send + Sync + 'static,
    F: Future<Output = Result<T, Error>> + Send + 'static,
{
    let controller = Controller::new(body);
    let result = controller.result.clone();
    runner.run(move || resume(&controller));
    result
}
