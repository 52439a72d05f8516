use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::Backoff;
use randevu::{Error, Promise, Runner, SubscriptionToken};

/// Completion callback for the sending side.
pub type SendCallback = Box<dyn FnOnce(Result<(), Error>) + Send>;
/// Delivery callback for the receiving side.
pub type RecvCallback<T> = Box<dyn FnOnce(Result<T, Error>) + Send>;

/// The party currently parked in the channel's slot.
enum Parked<T> {
    /// A sender advertised intent without producing yet; the callback
    /// unblocks it to compute once a receiver shows interest.
    SenderRegistered(SendCallback),
    /// A sender parked with a value until a receiver arrives.
    SenderWaiting(T, SendCallback),
    /// A receiver parked until a value arrives.
    ReceiverWaiting(RecvCallback<T>, Option<SubscriptionToken>),
}

// The tag always matches the variant it was packed with, so these only
// assert the encoding invariant.
impl<T> Parked<T> {
    fn registered(self) -> SendCallback {
        match self {
            Parked::SenderRegistered(ready) => ready,
            _ => unreachable!("tag says SenderRegistered"),
        }
    }

    fn waiting(self) -> (T, SendCallback) {
        match self {
            Parked::SenderWaiting(value, done) => (value, done),
            _ => unreachable!("tag says SenderWaiting"),
        }
    }

    fn receiving(self) -> (RecvCallback<T>, Option<SubscriptionToken>) {
        match self {
            Parked::ReceiverWaiting(recv, token) => (recv, token),
            _ => unreachable!("tag says ReceiverWaiting"),
        }
    }
}

// The state cell packs a `Box<Parked<T>>` pointer with a variant tag in
// the low bits (boxes of `Parked` are at least 8-aligned), so a CAS on
// one word is the entire transition and a loaded word can be matched on
// without dereferencing. Zero encodes the empty channel.
const EMPTY: usize = 0;
const TAG_REGISTERED: usize = 0b01;
const TAG_WAITING: usize = 0b10;
const TAG_RECEIVER: usize = 0b11;
const TAG_MASK: usize = 0b11;

fn pack<T>(parked: Parked<T>, tag: usize) -> usize {
    let raw = Box::into_raw(Box::new(parked)) as usize;
    debug_assert_eq!(raw & TAG_MASK, 0);
    raw | tag
}

/// Takes back ownership of a packed record.
///
/// # Safety
///
/// `word` must come from `pack` and the caller must be the thread that
/// displaced it from the cell (or hold the cell exclusively).
unsafe fn unpack<T>(word: usize) -> Box<Parked<T>> {
    unsafe { Box::from_raw((word & !TAG_MASK) as *mut Parked<T>) }
}

struct Inner<T> {
    state: AtomicUsize,
    runner: Runner,
    _marker: std::marker::PhantomData<T>,
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        // A party still parked when the last handle goes away is dropped
        // without being completed; a promise adapter parked here stays
        // pending forever.
        let word = *self.state.get_mut();
        if word != EMPTY {
            drop(unsafe { unpack::<T>(word) });
        }
    }
}

/// A single-slot rendezvous channel.
///
/// At most one sender and one receiver are ever parked; a value moves
/// from `send` to exactly one `receive` through a one-word CAS, and the
/// matched callbacks are dispatched through the channel's [`Runner`].
/// A second concurrent sender or receiver is rejected through its own
/// callback, inline, with the parked party untouched.
///
/// Handles are cheap clones of the same channel. Dropping the last
/// handle drops a still-parked party without completing it.
///
/// The sending side is expected to be a single logical sender; in
/// particular, `register_sender` followed by `send` from two different
/// threads has no defined ordering.
pub struct Channel<T: Send + 'static> {
    inner: Arc<Inner<T>>,
}

unsafe impl<T: Send + 'static> Send for Channel<T> {}
unsafe impl<T: Send + 'static> Sync for Channel<T> {}

impl<T: Send + 'static> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> Channel<T> {
    /// Creates a channel dispatching matched callbacks through `runner`.
    ///
    /// With [`Runner::Synchronous`] a `send` may run arbitrary receiver
    /// code on the sender's stack.
    pub fn new(runner: Runner) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: AtomicUsize::new(EMPTY),
                runner,
                _marker: std::marker::PhantomData,
            }),
        }
    }

    /// Identity of the underlying channel, shared by all clones.
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    fn load(&self) -> usize {
        self.inner.state.load(Ordering::Acquire)
    }

    fn cas(&self, current: usize, new: usize) -> bool {
        self.inner
            .state
            .compare_exchange(current, new, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn register_sender_boxed(
        &self,
        ready: SendCallback,
        token: Option<SubscriptionToken>,
    ) {
        if token.as_ref().is_some_and(|t| !t.is_active()) {
            return;
        }
        let mut ready = ready;
        let backoff = Backoff::new();
        loop {
            let prev = self.load();
            match prev & TAG_MASK {
                EMPTY => {
                    let fresh = pack(Parked::<T>::SenderRegistered(ready), TAG_REGISTERED);
                    if self.cas(prev, fresh) {
                        return;
                    }
                    ready = unsafe { unpack::<T>(fresh) }.registered();
                    backoff.spin();
                }
                TAG_REGISTERED | TAG_WAITING => {
                    // Misuse goes to the offending caller, inline; the
                    // parked sender is untouched.
                    ready(Err(Error::Misuse("another sender already waiting")));
                    return;
                }
                _ => {
                    // A receiver is already interested: unblock the
                    // sender to produce. The receiver stays parked.
                    self.inner.runner.run(move || ready(Ok(())));
                    return;
                }
            }
        }
    }

    pub(crate) fn send_boxed(&self, value: T, done: SendCallback, token: Option<SubscriptionToken>) {
        if token.as_ref().is_some_and(|t| !t.is_active()) {
            return;
        }
        let mut value = value;
        let mut done = done;
        let backoff = Backoff::new();
        loop {
            let prev = self.load();
            match prev & TAG_MASK {
                EMPTY | TAG_REGISTERED => {
                    let fresh = pack(Parked::SenderWaiting(value, done), TAG_WAITING);
                    if self.cas(prev, fresh) {
                        if prev != EMPTY {
                            // The send supersedes this sender's own
                            // registration; its wake-up is now moot.
                            drop(unsafe { unpack::<T>(prev) });
                        }
                        return;
                    }
                    (value, done) = unsafe { unpack::<T>(fresh) }.waiting();
                    backoff.spin();
                }
                TAG_WAITING => {
                    done(Err(Error::Misuse("another sender already waiting")));
                    return;
                }
                _ => {
                    // Rendezvous: claim the parked receiver.
                    if !self.cas(prev, EMPTY) {
                        backoff.spin();
                        continue;
                    }
                    let (recv, recv_token) = unsafe { unpack::<T>(prev) }.receiving();
                    // A tokened receiver is a select branch; delivery is
                    // its election. Losers were already served by some
                    // other channel, so the value stays with the sender
                    // and goes back around.
                    if recv_token.map_or(true, |t| t.release()) {
                        self.inner.runner.run(move || {
                            recv(Ok(value));
                            done(Ok(()));
                        });
                        return;
                    }
                    backoff.reset();
                }
            }
        }
    }

    pub(crate) fn receive_boxed(&self, recv: RecvCallback<T>, token: Option<SubscriptionToken>) {
        if token.as_ref().is_some_and(|t| !t.is_active()) {
            return;
        }
        let mut recv = recv;
        let mut token = token;
        let backoff = Backoff::new();
        loop {
            let prev = self.load();
            match prev & TAG_MASK {
                EMPTY => {
                    let fresh = pack(Parked::ReceiverWaiting(recv, token), TAG_RECEIVER);
                    if self.cas(prev, fresh) {
                        return;
                    }
                    (recv, token) = unsafe { unpack::<T>(fresh) }.receiving();
                    backoff.spin();
                }
                TAG_REGISTERED => {
                    // Park the receiver and wake the registered sender
                    // to start producing.
                    let fresh = pack(Parked::ReceiverWaiting(recv, token), TAG_RECEIVER);
                    if self.cas(prev, fresh) {
                        let ready = unsafe { unpack::<T>(prev) }.registered();
                        self.inner.runner.run(move || ready(Ok(())));
                        return;
                    }
                    (recv, token) = unsafe { unpack::<T>(fresh) }.receiving();
                    backoff.spin();
                }
                TAG_WAITING => {
                    if !self.cas(prev, EMPTY) {
                        backoff.spin();
                        continue;
                    }
                    let (value, done) = unsafe { unpack::<T>(prev) }.waiting();
                    if token.as_ref().map_or(true, |t| t.release()) {
                        self.inner.runner.run(move || {
                            recv(Ok(value));
                            done(Ok(()));
                        });
                    } else {
                        // Lost the election after claiming the sender;
                        // recirculate the value through the normal path
                        // so it is never dropped.
                        self.send_boxed(value, done, None);
                    }
                    return;
                }
                _ => {
                    // Claim the parked receiver to inspect it: a dead
                    // select loser is discarded, a live one makes the
                    // newcomer the offender.
                    if !self.cas(prev, EMPTY) {
                        backoff.spin();
                        continue;
                    }
                    let (parked_recv, parked_token) = unsafe { unpack::<T>(prev) }.receiving();
                    if parked_token.as_ref().is_some_and(|t| !t.is_active()) {
                        backoff.reset();
                        continue;
                    }
                    recv(Err(Error::Misuse("another reader already waiting")));
                    // Re-park the evicted receiver through the normal
                    // path; if a sender slipped in meanwhile it simply
                    // rendezvouses now.
                    self.receive_boxed(parked_recv, parked_token);
                    return;
                }
            }
        }
    }
}

/// The receiving interface of a rendezvous channel.
pub trait InputChannel<T: Send + Sync + 'static> {
    /// Parks `recv` until a value arrives, or delivers immediately if a
    /// sender is already waiting. A second concurrent receiver is
    /// rejected through its own callback. A released `token` makes the
    /// call a no-op.
    fn receive(&self, recv: RecvCallback<T>, token: Option<SubscriptionToken>);

    /// Promise adapter over [`receive`](InputChannel::receive).
    fn recv_async(&self) -> Promise<T> {
        let promise = Promise::new();
        let p = promise.clone();
        self.receive(
            Box::new(move |result| match result {
                Ok(value) => {
                    p.complete(value);
                }
                Err(error) => {
                    p.complete_exceptionally(error);
                }
            }),
            None,
        );
        promise
    }
}

/// The sending interface of a rendezvous channel.
pub trait OutputChannel<T: Send + 'static> {
    /// Advertises intent to send without producing a value yet; `ready`
    /// fires once a receiver shows interest, unblocking a lazy producer
    /// to compute. A second concurrent sender is rejected through
    /// `ready`.
    fn register_sender(&self, ready: SendCallback, token: Option<SubscriptionToken>);

    /// Parks `value` until a receiver arrives, or delivers immediately
    /// if one is already waiting; `done` fires once the value has been
    /// handed over. A second concurrent sender is rejected through
    /// `done`.
    fn send(&self, value: T, done: SendCallback, token: Option<SubscriptionToken>);

    /// Promise adapter over [`register_sender`](OutputChannel::register_sender).
    fn register_sender_async(&self) -> Promise<()> {
        let promise = Promise::new();
        let p = promise.clone();
        self.register_sender(
            Box::new(move |result| match result {
                Ok(()) => {
                    p.complete(());
                }
                Err(error) => {
                    p.complete_exceptionally(error);
                }
            }),
            None,
        );
        promise
    }

    /// Promise adapter over [`send`](OutputChannel::send).
    fn send_async(&self, value: T) -> Promise<()> {
        let promise = Promise::new();
        let p = promise.clone();
        self.send(
            value,
            Box::new(move |result| match result {
                Ok(()) => {
                    p.complete(());
                }
                Err(error) => {
                    p.complete_exceptionally(error);
                }
            }),
            None,
        );
        promise
    }
}

impl<T: Send + Sync + 'static> InputChannel<T> for Channel<T> {
    fn receive(&self, recv: RecvCallback<T>, token: Option<SubscriptionToken>) {
        self.receive_boxed(recv, token);
    }
}

impl<T: Send + 'static> OutputChannel<T> for Channel<T> {
    fn register_sender(&self, ready: SendCallback, token: Option<SubscriptionToken>) {
        self.register_sender_boxed(ready, token);
    }

    fn send(&self, value: T, done: SendCallback, token: Option<SubscriptionToken>) {
        self.send_boxed(value, done, token);
    }
}

/// Creates a rendezvous channel dispatching callbacks through `runner`.
pub fn channel<T: Send + 'static>(runner: Runner) -> Channel<T> {
    Channel::new(runner)
}
