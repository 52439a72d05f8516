use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, Thread};

// One-shot states. FRESH -> PARKED -> NOTIFIED is the slow path;
// FRESH -> NOTIFIED is a notify that won the race, letting the waiter
// return without ever parking.
const FRESH: u8 = 0;
const PARKED: u8 = 1;
const NOTIFIED: u8 = 2;

/// A one-shot wakeup cell.
///
/// Unlike a reusable condition variable, a signal fires once and stays
/// fired, so blocking loops allocate a fresh signal per round and a
/// racing `notify` is never lost. The waiter is whichever thread calls
/// `wait` — it registers itself at wait time, so a signal may be
/// created on one thread and awaited on another.
pub struct Signal {
    state: AtomicU8,
    waiter: Mutex<Option<Thread>>,
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl Signal {
    /// Creates an unfired signal with no waiter.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(FRESH),
            waiter: Mutex::new(None),
        }
    }

    /// Parks the calling thread until the signal fires. Returns
    /// immediately if it already has. At most one thread may wait on a
    /// signal over its lifetime.
    pub fn wait(&self) {
        *self.waiter.lock().unwrap() = Some(thread::current());
        if self
            .state
            .compare_exchange(FRESH, PARKED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // Fired before we could park.
            return;
        }
        while self.state.load(Ordering::Acquire) != NOTIFIED {
            thread::park();
        }
    }

    /// Fires the signal, waking the parked waiter if one got there
    /// first. Idempotent.
    pub fn notify(&self) {
        if self.state.swap(NOTIFIED, Ordering::AcqRel) == PARKED {
            // The waiter published its handle before advertising PARKED.
            if let Some(waiter) = self.waiter.lock().unwrap().take() {
                waiter.unpark();
            }
        }
    }

    /// Returns true if the signal has fired.
    pub fn is_notified(&self) -> bool {
        self.state.load(Ordering::Relaxed) == NOTIFIED
    }
}
