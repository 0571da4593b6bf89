//! Flat map from lowercased venue key to adapter (spec.md §4.F).
//!
//! Registration happens once at startup, single-threaded; after that,
//! `route` is a read-only lookup with no locking and no allocation — it
//! sits on the Receiver's hot path (`engine::receiver::process_message`)
//! once per inbound order.

use super::contract::Adapter;
use crate::containers::{FlatMap, InlineString};
use std::sync::Arc;

/// Venue key inline-string width. Venue names (`hyperliquid`, `bybit`, …)
/// are short exchange identifiers, never user input, so 32 bytes is ample.
pub type VenueKey = InlineString<32>;

/// Upper bound on distinct registered venues. A single-process deployment
/// routes to a handful of adapters; this is sized generously above that.
pub const MAX_VENUES: usize = 16;

pub struct VenueRouter {
    adapters: FlatMap<VenueKey, Arc<dyn Adapter>, MAX_VENUES>,
}

impl Default for VenueRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl VenueRouter {
    pub fn new() -> Self {
        Self {
            adapters: FlatMap::new(),
        }
    }

    /// Inserts under the adapter's own lowercased `name()`. A second
    /// registration for the same venue key replaces the first.
    pub fn register_adapter(&mut self, adapter: Arc<dyn Adapter>) {
        let key = VenueKey::from_str(&adapter.name().to_lowercase());
        if self.adapters.insert(key, adapter).is_err() {
            tracing::error!("venue router full, could not register adapter");
        }
    }

    /// Looks up a venue key case-insensitively without heap-allocating a
    /// lowercased copy: ASCII-lowers into a stack buffer and hands
    /// `InlineString::set` a borrowed `&str` over it.
    pub fn route(&self, venue_key: &str) -> Option<Arc<dyn Adapter>> {
        let mut buf = [0u8; VenueKey::CAPACITY];
        let bytes = venue_key.as_bytes();
        let n = bytes.len().min(VenueKey::CAPACITY);
        for (dst, src) in buf[..n].iter_mut().zip(&bytes[..n]) {
            *dst = src.to_ascii_lowercase();
        }
        // SAFETY: lowercasing an ASCII byte never changes UTF-8 validity,
        // and truncation (when venue_key exceeds capacity) lands on a byte
        // boundary because venue keys are plain ASCII identifiers.
        let lowered = std::str::from_utf8(&buf[..n]).unwrap_or("");
        let mut key = VenueKey::new();
        key.set(lowered);
        self.adapters.get(&key).cloned()
    }

    pub fn venues(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
