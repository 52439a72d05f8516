use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use crate::error::Error;
use crate::signal::Signal;

type Callback<T> = Box<dyn FnOnce(&Result<T, Error>) + Send>;

enum Cell<T> {
    Pending(Vec<Callback<T>>),
    Settled(Arc<Result<T, Error>>),
}

/// A single-assignment future cell.
///
/// A promise is either pending, completed with a value, or failed with
/// an [`Error`]. The first `complete` / `complete_exceptionally` wins;
/// every later attempt is a no-op that reports `false`. Settling a
/// promise happens-before every observation of its result.
///
/// `Promise` is a cloneable handle: clones observe the same cell. It
/// also implements [`std::future::Future`], which is how coroutine
/// bodies suspend on one — polling a pending promise registers the task
/// waker as a completion callback, so resumption runs on whatever
/// thread settles the promise.
pub struct Promise<T> {
    cell: Arc<Mutex<Cell<T>>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Send + 'static> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Promise<T> {
    /// Creates a pending promise.
    pub fn new() -> Self {
        Self {
            cell: Arc::new(Mutex::new(Cell::Pending(Vec::new()))),
        }
    }

    /// A promise already completed with `value`.
    pub fn completed(value: T) -> Self {
        let promise = Self::new();
        promise.complete(value);
        promise
    }

    /// A promise already failed with `error`.
    pub fn failed(error: Error) -> Self {
        let promise = Self::new();
        promise.complete_exceptionally(error);
        promise
    }

    /// Completes the promise with `value`. Returns whether this call
    /// performed the transition.
    pub fn complete(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Fails the promise with `error`. Returns whether this call
    /// performed the transition.
    pub fn complete_exceptionally(&self, error: Error) -> bool {
        self.settle(Err(error))
    }

    fn settle(&self, result: Result<T, Error>) -> bool {
        let result = Arc::new(result);
        let waiters = {
            let mut cell = self.cell.lock().unwrap();
            match &mut *cell {
                Cell::Pending(waiters) => {
                    let waiters = std::mem::take(waiters);
                    *cell = Cell::Settled(result.clone());
                    waiters
                }
                Cell::Settled(_) => return false,
            }
        };
        // Callbacks run outside the lock; they are allowed to re-enter
        // the promise (and routinely do, through wakers).
        for callback in waiters {
            callback(&result);
        }
        true
    }

    /// Registers `callback` to run with the settled result. Runs inline
    /// if the promise has already settled. Each callback runs exactly
    /// once, on the settling thread.
    pub fn when_complete(&self, callback: impl FnOnce(&Result<T, Error>) + Send + 'static) {
        let settled = {
            let mut cell = self.cell.lock().unwrap();
            match &mut *cell {
                Cell::Pending(waiters) => {
                    waiters.push(Box::new(callback));
                    return;
                }
                Cell::Settled(result) => result.clone(),
            }
        };
        callback(&settled);
    }

    /// Returns whether the promise has settled.
    pub fn is_done(&self) -> bool {
        matches!(&*self.cell.lock().unwrap(), Cell::Settled(_))
    }

    /// Non-blocking snapshot of the result, if settled.
    pub fn try_get(&self) -> Option<Result<T, Error>>
    where
        T: Clone,
    {
        match &*self.cell.lock().unwrap() {
            Cell::Settled(result) => Some((**result).clone()),
            Cell::Pending(_) => None,
        }
    }

    /// Blocks the calling thread until the promise settles.
    pub fn get(&self) -> Result<T, Error>
    where
        T: Clone,
    {
        let signal = Arc::new(Signal::new());
        let notify = signal.clone();
        self.when_complete(move |_| notify.notify());
        loop {
            if let Some(result) = self.try_get() {
                return result;
            }
            signal.wait();
        }
    }
}

impl<T: Clone + Send + 'static> Future for Promise<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(result) = self.try_get() {
            return Poll::Ready(result);
        }
        let waker = cx.waker().clone();
        self.when_complete(move |_| waker.wake());
        // The registration above fires inline when the promise settled
        // in between, so a final check keeps the fast path synchronous.
        match self.try_get() {
            Some(result) => Poll::Ready(result),
            None => Poll::Pending,
        }
    }
}
