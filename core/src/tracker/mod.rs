//! Order lifecycle tracking: the Pending and Processed maps (spec.md §4.G).

mod inflight;

pub use inflight::{reserve_slot, InFlightOrder};

use crate::containers::{FlatMap, Pool};
use crate::dto::ClientOrderId;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::warn;

/// Capacity of the Pending map. The Processed map is sized 2x this per
/// spec.md §4.G.
pub const PENDING_CAPACITY: usize = 4096;
pub const PROCESSED_CAPACITY: usize = PENDING_CAPACITY * 2;

/// Zero-sized token; the pool's only job is to gate how many orders may be
/// in flight at once and to give the Receiver an RAII handle it can hold
/// inside an `InFlightOrder` so early error returns never leak a slot.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrderSlot;

pub type OrderPool = Pool<OrderSlot, PENDING_CAPACITY>;

/// Outcome of a dedupe check against an inbound action (spec.md §4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupeDecision {
    /// Proceed with normal processing.
    Allow,
    /// A `place` whose `cl_id` is already live; drop the message.
    DuplicatePlace,
}

/// Two `FlatMap`s guarded by short-held mutexes, mutated from the Receiver
/// thread (new placements) and from callback dispatch (updates) alike.
///
/// **Processed-map eviction policy:** reject-on-full. The source material
/// left this open (spec.md §9); reject-on-full was chosen to match the
/// reject-on-full semantics already used by `FlatMap` everywhere else in
/// this engine, rather than introducing a second, different eviction
/// discipline just for this one map. See DESIGN.md.
pub struct OrderTracker {
    pending: Mutex<FlatMap<ClientOrderId, InFlightOrder, PENDING_CAPACITY>>,
    processed: Mutex<FlatMap<ClientOrderId, u64, PROCESSED_CAPACITY>>,
}

impl Default for OrderTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderTracker {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(FlatMap::new()),
            processed: Mutex::new(FlatMap::new()),
        }
    }

    fn key(cl_id: &str) -> ClientOrderId {
        ClientOrderId::from_str(cl_id)
    }

    /// Dedupe check for an inbound `place` (spec.md §4.G). `cancel` and
    /// `replace` are always idempotent and never call this.
    pub fn check_place_dedupe(&self, cl_id: &str, now_ns: u64) -> DedupeDecision {
        let key = Self::key(cl_id);
        if self.pending.lock().contains_key(&key) {
            warn!(cl_id, "duplicate place for pending order, dropping");
            return DedupeDecision::DuplicatePlace;
        }
        // In Processed but not Pending: a retry after cleanup is legitimate.
        let _ = now_ns;
        DedupeDecision::Allow
    }

    pub fn insert_pending(&self, cl_id: &str, order: InFlightOrder) {
        let key = Self::key(cl_id);
        if self.pending.lock().insert(key, order).is_err() {
            warn!(cl_id, "pending map full, could not track order");
        }
    }

    pub fn get_pending(&self, cl_id: &str) -> Option<InFlightOrder> {
        let key = Self::key(cl_id);
        self.pending.lock().get(&key).cloned()
    }

    pub fn update_pending<F: FnOnce(&mut InFlightOrder)>(&self, cl_id: &str, f: F) -> bool {
        let key = Self::key(cl_id);
        let mut guard = self.pending.lock();
        match guard.get_mut(&key) {
            Some(order) => {
                f(order);
                true
            }
            None => false,
        }
    }

    /// Remove the Pending entry for `cl_id`, if present. Called on any
    /// terminal status so the corresponding pool slot can be released.
    pub fn remove_pending(&self, cl_id: &str) -> Option<InFlightOrder> {
        let key = Self::key(cl_id);
        self.pending.lock().remove(&key)
    }

    pub fn record_processed(&self, cl_id: &str, first_seen_ns: u64) {
        let key = Self::key(cl_id);
        if self.processed.lock().insert(key, first_seen_ns).is_err() {
            warn!(cl_id, "processed map full (reject-on-full policy), not recorded");
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn processed_len(&self) -> usize {
        self.processed.lock().len()
    }
}

/// Bound on how long a lazy-rehydration `query_order` round trip may take
/// before the caller gives up and treats the update as terminal-with-no-InFlight.
pub const LAZY_REHYDRATION_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order(cl_id: &str) -> InFlightOrder {
        InFlightOrder::new(cl_id, "hyperliquid", "BTC-USDT-PERP", 0)
    }

    #[test]
    fn duplicate_place_is_rejected_while_pending() {
        let tracker = OrderTracker::new();
        tracker.insert_pending("T1", sample_order("T1"));
        assert_eq!(
            tracker.check_place_dedupe("T1", 0),
            DedupeDecision::DuplicatePlace
        );
    }

    #[test]
    fn fresh_place_is_allowed() {
        let tracker = OrderTracker::new();
        assert_eq!(tracker.check_place_dedupe("T1", 0), DedupeDecision::Allow);
    }

    #[test]
    fn removing_pending_clears_entry() {
        let tracker = OrderTracker::new();
        tracker.insert_pending("T1", sample_order("T1"));
        assert!(tracker.remove_pending("T1").is_some());
        assert!(tracker.get_pending("T1").is_none());
    }

    #[test]
    fn allow_reprocess_after_pending_removed_even_if_processed() {
        let tracker = OrderTracker::new();
        tracker.insert_pending("T1", sample_order("T1"));
        tracker.record_processed("T1", 0);
        tracker.remove_pending("T1");
        assert_eq!(tracker.check_place_dedupe("T1", 0), DedupeDecision::Allow);
    }
}
