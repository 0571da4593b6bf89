//! `InFlightOrder` — the live-order record held in the Pending map.

use super::{OrderPool, OrderSlot, PENDING_CAPACITY};
use crate::containers::PoolGuard;
use std::collections::HashMap;
use std::sync::Arc;

/// An order currently believed to be live at a venue. Created either by the
/// Receiver on a successful `place`, or synthesized during rehydration /
/// lazy rehydration (spec.md §4.G), in which case `tags` carries
/// `execution_type=external`.
///
/// Engine-originated entries hold a slot acquired from the [`OrderPool`];
/// the `Arc<PoolGuard>` releases the slot back to the pool when the last
/// clone of this `InFlightOrder` is dropped, so removing it from Pending is
/// enough to free the slot with no separate bookkeeping.
#[derive(Debug, Clone)]
pub struct InFlightOrder {
    pub cl_id: String,
    pub venue: String,
    pub symbol: String,
    pub exchange_order_id: Option<String>,
    /// `receive_ts_ns`, recorded as early as possible for latency
    /// measurement (spec.md §4.H).
    pub receive_ts_ns: u64,
    pub tags: HashMap<String, String>,
    slot: Option<Arc<PoolGuard<OrderSlot, PENDING_CAPACITY>>>,
}

impl InFlightOrder {
    pub fn new(cl_id: &str, venue: &str, symbol: &str, receive_ts_ns: u64) -> Self {
        Self {
            cl_id: cl_id.to_string(),
            venue: venue.to_string(),
            symbol: symbol.to_string(),
            exchange_order_id: None,
            receive_ts_ns,
            tags: HashMap::new(),
            slot: None,
        }
    }

    /// An entry synthesized by rehydration or lazy rehydration rather than
    /// created from an engine-originated `place`. These do not occupy a
    /// pool slot: they were never accepted through the normal placement
    /// path that reserves one.
    pub fn external(cl_id: &str, venue: &str, symbol: &str, receive_ts_ns: u64) -> Self {
        let mut order = Self::new(cl_id, venue, symbol, receive_ts_ns);
        order.tags.insert("execution_type".to_string(), "external".to_string());
        order
    }

    pub fn with_slot(mut self, slot: PoolGuard<OrderSlot, PENDING_CAPACITY>) -> Self {
        self.slot = Some(Arc::new(slot));
        self
    }

    /// Carries the inbound order's tag map (e.g. `strategy`) through to
    /// outbound reports and fills, which merge it with `venue`/`execution_type`.
    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn is_external(&self) -> bool {
        self.tags.get("execution_type").map(String::as_str) == Some("external")
    }
}

/// Acquire a slot from `pool`, returning `None` when exhausted.
pub fn reserve_slot(pool: &OrderPool) -> Option<PoolGuard<OrderSlot, PENDING_CAPACITY>> {
    pool.allocate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_orders_are_tagged() {
        let order = InFlightOrder::external("T1", "hyperliquid", "BTC-USDT-PERP", 0);
        assert!(order.is_external());
    }

    #[test]
    fn engine_created_orders_are_not_external() {
        let order = InFlightOrder::new("T1", "hyperliquid", "BTC-USDT-PERP", 0);
        assert!(!order.is_external());
    }

    #[test]
    fn slot_returns_to_pool_when_order_dropped() {
        let pool = OrderPool::new();
        let guard = reserve_slot(&pool).unwrap();
        assert_eq!(pool.available(), PENDING_CAPACITY - 1);
        let order = InFlightOrder::new("T1", "hyperliquid", "BTC-USDT-PERP", 0).with_slot(guard);
        drop(order);
        assert_eq!(pool.available(), PENDING_CAPACITY);
    }
}
