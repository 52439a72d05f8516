use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A one-shot election flag shared between competing callbacks.
///
/// Clones observe the same flag. `release` flips active to inactive at
/// most once across all clones; the caller whose CAS performs the flip
/// gets `true` and has thereby won the election. The flag is monotonic:
/// once inactive it never becomes active again.
///
/// This is an election, not a cancellation: losing parties keep running,
/// they just drop whatever they were about to deliver.
#[derive(Clone)]
pub struct SubscriptionToken {
    active: Arc<AtomicBool>,
}

impl Default for SubscriptionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionToken {
    /// Creates a token in the active state.
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns whether the token is still active. May be stale by the
    /// time the caller acts on it; only `release` decides the winner.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Deactivates the token. Returns true for exactly one caller ever.
    #[inline]
    pub fn release(&self) -> bool {
        self.active
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }
}
