use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, Weak};
use std::task::{Context, Poll, Wake, Waker};

use randevu::{Error, PollGate, Promise};

/// Pull interface of an async generator.
pub trait AsyncIterator<T> {
    /// Advances the body towards its next suspension; the promise
    /// completes with whether another element exists, fails with the
    /// body's error, or fails with a reentrancy misuse.
    fn has_next(&self) -> Promise<bool>;

    /// Returns the element made available by the last `has_next`. From
    /// `Initial`/`Ready` this blocks on `has_next` first, so consumers
    /// that can afford to block get a synchronous view.
    fn next(&self) -> Result<T, Error>;
}

enum Phase<T> {
    Initial,
    Ready,
    /// The body is either on some thread's stack right now or parked on
    /// an awaited promise; either way, no public entry may touch it.
    Running,
    HasValue(T),
    Stopped,
    Exception(Error),
}

struct GenCore<T> {
    phase: Phase<T>,
    /// Set by the yield future mid-poll; the driver turns it into
    /// `HasValue` only after the body's poll has returned, so consumer
    /// callbacks never run with the body still on the stack.
    deposit: Option<T>,
    /// The at-most-one `has_next` promise handed out while `Running`.
    outstanding: Option<Promise<bool>>,
}

type GenBody = Pin<Box<dyn Future<Output = Result<(), Error>> + Send>>;

struct GenInner<T> {
    core: Mutex<GenCore<T>>,
    body: Mutex<Option<GenBody>>,
    gate: PollGate,
}

struct GenWaker<T: Send + 'static> {
    inner: Arc<GenInner<T>>,
}

impl<T: Send + 'static> Wake for GenWaker<T> {
    fn wake(self: Arc<Self>) {
        resume(&self.inner);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        resume(&self.inner);
    }
}

fn resume<T: Send + 'static>(inner: &Arc<GenInner<T>>) {
    if !inner.gate.try_begin() {
        return;
    }
    loop {
        poll_once(inner);
        if !inner.gate.finish() {
            return;
        }
    }
}

fn poll_once<T: Send + 'static>(inner: &Arc<GenInner<T>>) {
    {
        // Only a resumption intent reaches the body; stale wakes from
        // long-settled promises land here and die.
        let core = inner.core.lock().unwrap();
        if !matches!(core.phase, Phase::Running) {
            return;
        }
    }

    let mut slot = inner.body.lock().unwrap();
    let Some(body) = slot.as_mut() else {
        return;
    };
    let waker = Waker::from(Arc::new(GenWaker {
        inner: inner.clone(),
    }));
    let mut cx = Context::from_waker(&waker);
    match body.as_mut().poll(&mut cx) {
        Poll::Ready(outcome) => {
            *slot = None;
            drop(slot);
            let (verdict, outstanding) = {
                let mut core = inner.core.lock().unwrap();
                let outstanding = core.outstanding.take();
                match outcome {
                    Ok(()) => {
                        core.phase = Phase::Stopped;
                        (Ok(false), outstanding)
                    }
                    Err(error) => {
                        core.phase = Phase::Exception(error.clone());
                        (Err(error), outstanding)
                    }
                }
            };
            if let Some(promise) = outstanding {
                match verdict {
                    Ok(more) => {
                        promise.complete(more);
                    }
                    Err(error) => {
                        promise.complete_exceptionally(error);
                    }
                }
            }
        }
        Poll::Pending => {
            drop(slot);
            // A deposit means the body parked at a yield; no deposit
            // means it parked on an awaited promise and stays Running
            // with the outstanding has_next still pending.
            let yielded = {
                let mut core = inner.core.lock().unwrap();
                match core.deposit.take() {
                    Some(value) => {
                        core.phase = Phase::HasValue(value);
                        core.outstanding.take()
                    }
                    None => None,
                }
            };
            if let Some(promise) = yielded {
                promise.complete(true);
            }
        }
    }
}

/// The handle an `async_generate` body yields through. Awaiting a
/// [`Promise`] inside the body is the other suspension point; the
/// promise's settling thread resumes the body.
pub struct AsyncScope<T: Send + 'static> {
    inner: Weak<GenInner<T>>,
}

impl<T: Send + 'static> Clone for AsyncScope<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> AsyncScope<T> {
    /// Suspends the body, handing `value` to the consumer.
    pub fn yield_value(&self, value: T) -> AsyncYield<T> {
        AsyncYield {
            inner: self.inner.clone(),
            value: Some(value),
        }
    }
}

/// Suspension future returned by [`AsyncScope::yield_value`].
pub struct AsyncYield<T: Send + 'static> {
    inner: Weak<GenInner<T>>,
    value: Option<T>,
}

impl<T: Send + 'static> Unpin for AsyncYield<T> {}

impl<T: Send + 'static> Future for AsyncYield<T> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        match self.value.take() {
            Some(value) => {
                // The scope holds the generator weakly (the generator
                // owns the body, which owns the scope); while the body
                // is being polled the generator is necessarily alive.
                if let Some(inner) = self.inner.upgrade() {
                    inner.core.lock().unwrap().deposit = Some(value);
                }
                Poll::Pending
            }
            None => Poll::Ready(()),
        }
    }
}

/// A lazy, re-iterable asynchronous sequence produced by a coroutine
/// body that may suspend on both `yield_value` and awaited promises.
pub struct AsyncSequence<T: Send + 'static> {
    factory: Arc<dyn Fn(AsyncScope<T>) -> GenBody + Send + Sync>,
}

impl<T: Send + 'static> Clone for AsyncSequence<T> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
        }
    }
}

/// Creates a lazy asynchronous sequence from a coroutine body.
///
/// The body starts on the first `has_next` call of each iterator. An
/// awaited promise that never settles pins its iterator forever; the
/// core has no cancellation.
///
/// ```
/// use randevu::Promise;
/// use randevu_gen::{AsyncIterator, async_generate};
///
/// let seq = async_generate(|scope| async move {
///     let base = Promise::completed("O".to_string()).await?;
///     scope.yield_value(base + "K").await;
///     Ok(())
/// });
///
/// let it = seq.iterator();
/// assert_eq!(it.has_next().get(), Ok(true));
/// assert_eq!(it.next().unwrap(), "OK");
/// assert_eq!(it.has_next().get(), Ok(false));
/// ```
pub fn async_generate<T, F, Fut>(body: F) -> AsyncSequence<T>
where
    T: Send + 'static,
    F: Fn(AsyncScope<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
    AsyncSequence {
        factory: Arc::new(move |scope| Box::pin(body(scope))),
    }
}

impl<T: Send + 'static> AsyncSequence<T> {
    /// Starts a fresh pass over the sequence.
    pub fn iterator(&self) -> AsyncGenIter<T> {
        let inner = Arc::new(GenInner {
            core: Mutex::new(GenCore {
                phase: Phase::Initial,
                deposit: None,
                outstanding: None,
            }),
            body: Mutex::new(None),
            gate: PollGate::new(),
        });
        let body = (self.factory)(AsyncScope {
            inner: Arc::downgrade(&inner),
        });
        *inner.body.lock().unwrap() = Some(body);
        AsyncGenIter { inner }
    }
}

/// One pass over an [`AsyncSequence`]. Cloneable so a body can be
/// handed its own iterator (which is also how the reentrancy guard is
/// tripped); the discipline is still a single logical consumer.
pub struct AsyncGenIter<T: Send + 'static> {
    inner: Arc<GenInner<T>>,
}

impl<T: Send + 'static> Clone for AsyncGenIter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> AsyncIterator<T> for AsyncGenIter<T> {
    fn has_next(&self) -> Promise<bool> {
        enum Entry {
            Resume,
            Answer(bool),
            Fail(Error),
        }

        let promise = Promise::new();
        let entry = {
            let mut core = self.inner.core.lock().unwrap();
            match &core.phase {
                Phase::Initial | Phase::Ready => {
                    core.phase = Phase::Running;
                    core.outstanding = Some(promise.clone());
                    Entry::Resume
                }
                Phase::HasValue(_) => Entry::Answer(true),
                Phase::Stopped => Entry::Answer(false),
                Phase::Exception(error) => Entry::Fail(error.clone()),
                Phase::Running => Entry::Fail(Error::Misuse("illegal reentrancy")),
            }
        };
        match entry {
            Entry::Resume => resume(&self.inner),
            Entry::Answer(more) => {
                promise.complete(more);
            }
            Entry::Fail(error) => {
                promise.complete_exceptionally(error);
            }
        }
        promise
    }

    fn next(&self) -> Result<T, Error> {
        loop {
            {
                let mut core = self.inner.core.lock().unwrap();
                match &core.phase {
                    Phase::HasValue(_) => {
                        let Phase::HasValue(value) =
                            std::mem::replace(&mut core.phase, Phase::Ready)
                        else {
                            unreachable!()
                        };
                        return Ok(value);
                    }
                    Phase::Stopped => return Err(Error::Exhausted),
                    Phase::Exception(error) => return Err(error.clone()),
                    Phase::Running => return Err(Error::Misuse("illegal reentrancy")),
                    Phase::Initial | Phase::Ready => {}
                }
            }
            self.has_next().get()?;
        }
    }
}
