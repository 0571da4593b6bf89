//! The uniform venue adapter contract (spec.md §4.E).
//!
//! Every venue integration, reference or otherwise, implements [`Adapter`].
//! `place_order` is synchronous and must return a definitive accept/reject;
//! everything that happens afterwards (fills, status transitions) arrives
//! through the callbacks an adapter is handed via the `set_*_callback`
//! methods. Callbacks may be invoked from any adapter-owned thread — the
//! engine treats them as possibly-concurrent and is responsible for
//! serializing its own downstream writes.

use rust_decimal::Decimal;
use std::sync::Arc;

pub type OrderUpdateCallback = Arc<dyn Fn(OrderUpdate) + Send + Sync>;
pub type FillCallback = Arc<dyn Fn(FillData) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(String) + Send + Sync>;

/// A normalized place/modify request, already translated into the venue's
/// own symbol and numeric conventions by the caller (the engine's
/// normalization layer runs before the adapter ever sees this).
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub cl_id: String,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub time_in_force: String,
    /// Decimal-string, no trailing zeros — per spec.md §4.E.
    pub price: Option<String>,
    pub size: String,
    pub stop_price: Option<String>,
    pub reduce_only: bool,
}

#[derive(Debug, Clone)]
pub struct OrderResponse {
    pub success: bool,
    pub exchange_order_id: Option<String>,
    pub message: String,
}

impl OrderResponse {
    pub fn ok(exchange_order_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            exchange_order_id: Some(exchange_order_id.into()),
            message: message.into(),
        }
    }

    pub fn reject(message: impl Into<String>) -> Self {
        Self {
            success: false,
            exchange_order_id: None,
            message: message.into(),
        }
    }

    /// True when the venue's rejection text indicates the target simply
    /// does not exist (spec.md §4.H: treated as a successful cancel).
    pub fn is_not_found(&self) -> bool {
        !self.success && self.message.to_lowercase().contains("not found")
    }
}

/// An asynchronous order-lifecycle update delivered via
/// [`Adapter::set_order_update_callback`].
#[derive(Debug, Clone)]
pub struct OrderUpdate {
    pub cl_id: String,
    pub exchange_order_id: Option<String>,
    pub raw_status: String,
    pub raw_reason: String,
    pub price: Option<Decimal>,
    pub size: Option<Decimal>,
    pub filled_size: Option<Decimal>,
}

/// A fill delivered via [`Adapter::set_fill_callback`].
#[derive(Debug, Clone)]
pub struct FillData {
    pub cl_id: String,
    pub exchange_order_id: String,
    pub exec_id: String,
    pub symbol: String,
    pub price: Decimal,
    pub size: Decimal,
    pub fee_currency: String,
    pub fee_amount: Decimal,
    /// `"maker"` or `"taker"`, venue-raw; the engine maps this to
    /// [`crate::dto::Liquidity`].
    pub liquidity: String,
    pub tags: std::collections::HashMap<String, String>,
}

/// One row of `list_open_orders` (spec.md §4.E), used for rehydration.
#[derive(Debug, Clone)]
pub struct OpenOrder {
    pub cl_id: String,
    pub exchange_order_id: String,
    pub symbol: String,
    pub side: String,
    pub size: Decimal,
    pub price: Decimal,
    pub status: String,
}

/// The venue-agnostic adapter contract. Implementors hold their own
/// interior mutability (atomics, mutexes) since every method takes `&self`
/// — the engine calls into adapters from the Receiver thread while adapter
/// callback threads call back out concurrently.
pub trait Adapter: Send + Sync {
    /// Lowercased venue key, matching the `venue` field on inbound orders.
    fn name(&self) -> &str;

    fn initialize(&self, api_key: &str, api_secret: &str, testnet: bool) -> bool;

    /// May succeed partially — e.g. REST usable, WS not yet connected.
    fn connect(&self) -> bool;

    fn disconnect(&self);

    fn is_connected(&self) -> bool;

    fn place_order(&self, request: OrderRequest) -> OrderResponse;

    fn cancel_order(
        &self,
        cl_id: &str,
        symbol: Option<&str>,
        exchange_order_id: Option<&str>,
    ) -> OrderResponse;

    fn modify_order(
        &self,
        cl_id: &str,
        new_size: Option<&str>,
        new_price: Option<&str>,
    ) -> OrderResponse;

    /// Current status is reported in `OrderResponse::message`.
    fn query_order(&self, cl_id: &str) -> OrderResponse;

    fn list_open_orders(
        &self,
        category: Option<&str>,
        symbol: Option<&str>,
        settle: Option<&str>,
        base_coin: Option<&str>,
    ) -> Vec<OpenOrder>;

    fn set_order_update_callback(&self, callback: OrderUpdateCallback);

    fn set_fill_callback(&self, callback: FillCallback);

    fn set_error_callback(&self, callback: ErrorCallback);
}
