//! Redelivery filter keyed by provider message id

use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;

/// Completed ids remembered before the oldest are forgotten
pub const LEDGER_CAPACITY: usize = 4096;

/// Tracks message ids that are being processed or were processed successfully.
///
/// A claim that fails is released so the provider's next delivery of the
/// same message is processed again.
pub struct MessageLedger {
    in_flight: HashSet<String>,
    completed: LruCache<String, ()>,
}

impl Default for MessageLedger {
    fn default() -> Self {
        Self::with_capacity(LEDGER_CAPACITY)
    }
}

impl MessageLedger {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            in_flight: HashSet::new(),
            completed: LruCache::new(capacity),
        }
    }

    /// Start processing `id`. False if it is in flight or already done.
    pub fn claim(&mut self, id: &str) -> bool {
        if self.completed.contains(id) {
            return false;
        }
        self.in_flight.insert(id.to_string())
    }

    /// Give up a claim after a failure
    pub fn release(&mut self, id: &str) {
        self.in_flight.remove(id);
    }

    /// Record a successfully processed id
    pub fn complete(&mut self, id: &str) {
        self.in_flight.remove(id);
        self.completed.put(id.to_string(), ());
    }
}
