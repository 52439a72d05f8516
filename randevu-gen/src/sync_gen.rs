use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use crate::step::Step;
use crate::waker::deny_waker;

/// What a body handed over at its latest yield.
enum Deposit<T> {
    One(T),
    Many(Box<dyn Iterator<Item = T>>),
}

type Slot<T> = Rc<RefCell<Option<Deposit<T>>>>;
type Body = Pin<Box<dyn Future<Output = ()>>>;

/// The handle a `generate` body yields through.
pub struct SyncScope<T> {
    slot: Slot<T>,
}

impl<T> SyncScope<T> {
    /// Suspends the body, handing `value` to the consumer.
    pub fn yield_value(&self, value: T) -> SyncYield<T> {
        SyncYield {
            slot: self.slot.clone(),
            deposit: Some(Deposit::One(value)),
        }
    }

    /// Suspends the body, handing the consumer a whole iterator to
    /// drain before the body resumes. Nesting generators this way costs
    /// one delegation level per generator, not one wrapper per element.
    pub fn yield_all<I>(&self, values: I) -> SyncYield<T>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        SyncYield {
            slot: self.slot.clone(),
            deposit: Some(Deposit::Many(Box::new(values.into_iter()))),
        }
    }
}

/// Suspension future returned by [`SyncScope::yield_value`] and
/// [`SyncScope::yield_all`]. First poll deposits and parks; the poll
/// after resumption completes it.
pub struct SyncYield<T> {
    slot: Slot<T>,
    deposit: Option<Deposit<T>>,
}

impl<T> Unpin for SyncYield<T> {}

impl<T> Future for SyncYield<T> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        match self.deposit.take() {
            Some(deposit) => {
                *self.slot.borrow_mut() = Some(deposit);
                Poll::Pending
            }
            None => Poll::Ready(()),
        }
    }
}

/// A lazy, re-iterable, pull-driven sequence produced by a coroutine
/// body.
///
/// Each [`iter`](Sequence::iter) call runs the body factory afresh, so
/// the sequence can be consumed any number of times. The body makes no
/// progress beyond what the consumer pulls.
pub struct Sequence<T> {
    factory: Rc<dyn Fn(SyncScope<T>) -> Body>,
}

impl<T> Clone for Sequence<T> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
        }
    }
}

/// Creates a lazy sequence from a coroutine body.
///
/// The body suspends on `scope.yield_value(..)` / `scope.yield_all(..)`
/// only; awaiting anything else panics, since a sync sequence has no
/// driver to resume it.
///
/// ```
/// use randevu_gen::generate;
///
/// let doubled = generate(|scope| async move {
///     for i in 1..=3 {
///         scope.yield_value(2 * i).await;
///     }
/// });
/// assert_eq!(doubled.to_list(), vec![2, 4, 6]);
/// assert_eq!(doubled.to_list(), vec![2, 4, 6]);
/// ```
pub fn generate<T, F, Fut>(body: F) -> Sequence<T>
where
    T: 'static,
    F: Fn(SyncScope<T>) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    Sequence {
        factory: Rc::new(move |scope| Box::pin(body(scope))),
    }
}

/// A sequence over an in-memory vector.
pub fn sequence_of<T: Clone + 'static>(values: Vec<T>) -> Sequence<T> {
    generate(move |scope| {
        let values = values.clone();
        async move {
            scope.yield_all(values).await;
        }
    })
}

impl<T: 'static> Sequence<T> {
    /// Starts a fresh pass over the sequence.
    pub fn iter(&self) -> SequenceIter<T> {
        let slot: Slot<T> = Rc::new(RefCell::new(None));
        let body = (self.factory)(SyncScope { slot: slot.clone() });
        SequenceIter {
            body: Some(body),
            slot,
            step: Step::NotReady,
        }
    }

    /// Drains a fresh pass into a vector.
    pub fn to_list(&self) -> Vec<T> {
        self.iter().collect()
    }
}

impl<'a, T: 'static> IntoIterator for &'a Sequence<T> {
    type Item = T;
    type IntoIter = SequenceIter<T>;

    fn into_iter(self) -> SequenceIter<T> {
        self.iter()
    }
}

/// One pass over a [`Sequence`].
pub struct SequenceIter<T> {
    body: Option<Body>,
    slot: Slot<T>,
    step: Step<T>,
}

impl<T: 'static> SequenceIter<T> {
    /// Whether another element is available, computing it if needed.
    /// A poisoned iterator answers `false`; the `next` call panics.
    pub fn has_next(&mut self) -> bool {
        loop {
            match &mut self.step {
                Step::Ready(_) => return true,
                Step::ManyReady(inner) => match inner.next() {
                    Some(value) => {
                        self.step = Step::Ready(value);
                        return true;
                    }
                    None => self.step = Step::NotReady,
                },
                Step::NotReady => self.compute_next(),
                Step::Done => return false,
                Step::Failed => return false,
            }
        }
    }

    /// Resumes the body once. Poisons the step first so a body that
    /// parks without depositing (or panics) leaves the iterator failed.
    fn compute_next(&mut self) {
        let Some(body) = self.body.as_mut() else {
            self.step = Step::Done;
            return;
        };
        self.step = Step::Failed;
        let waker = deny_waker();
        let mut cx = Context::from_waker(&waker);
        match body.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                self.body = None;
                self.step = Step::Done;
            }
            Poll::Pending => match self.slot.borrow_mut().take() {
                Some(Deposit::One(value)) => self.step = Step::Ready(value),
                Some(Deposit::Many(inner)) => self.step = Step::ManyReady(inner),
                None => {}
            },
        }
    }
}

impl<T: 'static> Iterator for SequenceIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            match std::mem::replace(&mut self.step, Step::NotReady) {
                Step::Ready(value) => return Some(value),
                Step::ManyReady(mut inner) => match inner.next() {
                    Some(value) => {
                        self.step = Step::ManyReady(inner);
                        return Some(value);
                    }
                    None => {}
                },
                Step::NotReady => self.compute_next(),
                Step::Done => {
                    self.step = Step::Done;
                    return None;
                }
                Step::Failed => {
                    self.step = Step::Failed;
                    panic!("generator body suspended without yielding a value");
                }
            }
        }
    }
}
