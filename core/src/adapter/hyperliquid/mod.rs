//! Reference adapter: a perpetual-futures DEX integrating a private
//! WebSocket stream and a signed REST action endpoint (spec.md §4.I).
//!
//! `place_order`/`cancel_order`/`modify_order`/`query_order` are
//! synchronous from the trait's point of view; internally they block on
//! this adapter's own Tokio runtime, which also hosts the WS reader task
//! started by `connect()`.

pub mod mapping;
pub mod meta;
pub mod rest;
pub mod signer;
pub mod ws;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::adapter::{
    Adapter, ErrorCallback, FillCallback, OpenOrder, OrderRequest, OrderResponse,
    OrderUpdateCallback,
};
use crate::config::HyperliquidConfig;

use meta::AssetMeta;
use rest::RestClient;
use signer::SignerClient;
use ws::WsCallbacks;

struct OrderLocator {
    coin: String,
    oid: u64,
}

struct TokenBucket {
    capacity: f64,
    state: Mutex<(f64, Instant)>,
    refill_per_sec: f64,
}

impl TokenBucket {
    fn new(capacity: f64, refill_per_sec: f64) -> Self {
        Self {
            capacity,
            state: Mutex::new((capacity, Instant::now())),
            refill_per_sec,
        }
    }

    /// Local token-bucket rate limit (spec.md §4.I). Returns `false` when
    /// exhausted; the caller maps that to `rate_limited`.
    fn try_acquire(&self) -> bool {
        let mut guard = self.state.lock();
        let (tokens, last) = *guard;
        let elapsed = last.elapsed().as_secs_f64();
        let refilled = (tokens + elapsed * self.refill_per_sec).min(self.capacity);
        if refilled >= 1.0 {
            *guard = (refilled - 1.0, Instant::now());
            true
        } else {
            *guard = (refilled, Instant::now());
            false
        }
    }
}

/// Base asset name from a canonical hyphenated symbol. Hyperliquid's
/// coin universe is quoted implicitly in USD, so only the base survives.
fn symbol_to_coin(symbol: &str) -> String {
    symbol.split('-').next().unwrap_or(symbol).to_uppercase()
}

/// Canonical hyphenated symbol for a bare venue coin name.
fn coin_to_symbol(coin: &str) -> String {
    format!("{}-USD-PERP", coin.to_uppercase())
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub struct HyperliquidAdapter {
    name: String,
    config: HyperliquidConfig,
    runtime: tokio::runtime::Runtime,
    rest: RestClient,
    meta: RwLock<AssetMeta>,
    signer: SignerClient,
    ws_callbacks: Arc<WsCallbacks>,
    error_cb: Mutex<Option<ErrorCallback>>,
    orders: Mutex<HashMap<String, OrderLocator>>,
    connected: AtomicBool,
    ws_shutdown: Arc<AtomicBool>,
    rate_limiter: TokenBucket,
    ws_idle_timeout: Duration,
}

impl HyperliquidAdapter {
    pub fn new(config: HyperliquidConfig, rest_timeout: Duration, ws_idle_timeout: Duration) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let rest = RestClient::new(config.rest_url.clone(), rest_timeout);
        let signer = SignerClient::new(config.signer_path.clone())?;

        Ok(Self {
            name: "hyperliquid".to_string(),
            config,
            runtime,
            rest,
            meta: RwLock::new(AssetMeta::default()),
            signer,
            ws_callbacks: Arc::new(WsCallbacks::new()),
            error_cb: Mutex::new(None),
            orders: Mutex::new(HashMap::new()),
            connected: AtomicBool::new(false),
            ws_shutdown: Arc::new(AtomicBool::new(false)),
            rate_limiter: TokenBucket::new(20.0, 20.0),
            ws_idle_timeout,
        })
    }

    fn asset_index(&self, coin: &str) -> Option<u32> {
        self.meta.read().asset_index(coin)
    }

    fn sz_decimals(&self, asset_index: u32) -> u32 {
        self.meta.read().sz_decimals_for(asset_index)
    }

    fn place_action(
        &self,
        asset_index: u32,
        is_buy: bool,
        price: &str,
        size: &str,
        reduce_only: bool,
        order_type: Value,
        cl_id: &str,
    ) -> Value {
        json!({
            "type": "order",
            "orders": [{
                "a": asset_index,
                "b": is_buy,
                "p": mapping::trim_decimal_string(price),
                "s": mapping::trim_decimal_string(size),
                "r": reduce_only,
                "t": order_type,
                "c": cl_id,
            }],
            "grouping": "na",
        })
    }

    fn report_network_error(err: rest::RestError) -> OrderResponse {
        match err {
            rest::RestError::CircuitOpen => OrderResponse::reject("network_error: circuit open"),
            rest::RestError::Timeout => OrderResponse::reject("network_error: timeout"),
            rest::RestError::Transport(msg) => OrderResponse::reject(format!("network_error: {msg}")),
            rest::RestError::Http { status, body } => {
                OrderResponse::reject(format!("venue_reject: http {status}: {body}"))
            }
            rest::RestError::Decode(msg) => OrderResponse::reject(format!("venue_reject: decode error: {msg}")),
        }
    }

    fn extract_oid(response: &Value) -> Option<u64> {
        let status = response.pointer("/response/data/statuses/0")?;
        status
            .get("resting")
            .and_then(|r| r.get("oid"))
            .or_else(|| status.get("filled").and_then(|f| f.get("oid")))
            .and_then(|v| v.as_u64())
    }
}

impl Adapter for HyperliquidAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    /// Fetches asset metadata (coin→asset_index, coin→szDecimals), per
    /// spec.md §4.I "Init". `api_key`/`api_secret` are unused — credentials
    /// for this venue are resolved from environment variables into
    /// `HyperliquidConfig`, and the private key never enters this process.
    fn initialize(&self, _api_key: &str, _api_secret: &str, _testnet: bool) -> bool {
        match self.runtime.block_on(meta::fetch_meta(&reqwest::Client::new(), &self.config.rest_url)) {
            Ok(fetched) => {
                *self.meta.write() = fetched;
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to fetch hyperliquid asset metadata");
                false
            }
        }
    }

    /// Opens the private WebSocket stream and starts its read task.
    fn connect(&self) -> bool {
        self.ws_shutdown.store(false, Ordering::SeqCst);
        let ws_url = self.config.ws_url.clone();
        let user_address = self.config.user_address.clone();
        let callbacks = self.ws_callbacks.clone();
        let shutdown = self.ws_shutdown.clone();
        let idle_timeout = self.ws_idle_timeout;

        self.runtime
            .spawn(async move { ws::run(ws_url, user_address, idle_timeout, callbacks, shutdown).await });
        self.connected.store(true, Ordering::SeqCst);
        true
    }

    fn disconnect(&self) {
        self.ws_shutdown.store(true, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn place_order(&self, request: OrderRequest) -> OrderResponse {
        if !self.rate_limiter.try_acquire() {
            return OrderResponse::reject("rate limit: local token bucket exhausted");
        }

        let coin = symbol_to_coin(&request.symbol);
        let Some(asset_index) = self.asset_index(&coin) else {
            return OrderResponse::reject(format!("venue_reject: unknown coin {coin}"));
        };

        let mut order_type = match mapping::order_type_payload(&request.order_type) {
            Ok(value) => value,
            Err(err) => return OrderResponse::reject(format!("invalid_params: {err}")),
        };

        if let Some(trigger) = order_type.get_mut("trigger") {
            let Some(stop_price) = request.stop_price.as_deref() else {
                return OrderResponse::reject("invalid_params: stop_price required");
            };
            trigger["triggerPx"] = json!(mapping::trim_decimal_string(stop_price));
        }

        let Some(price) = request.price.as_deref() else {
            return OrderResponse::reject("invalid_params: price required");
        };

        let action = self.place_action(
            asset_index,
            request.side.eq_ignore_ascii_case("buy"),
            price,
            &request.size,
            request.reduce_only,
            order_type,
            &request.cl_id,
        );

        let nonce = now_millis();
        let signature = match self.signer.sign(&action, nonce) {
            Ok(sig) => sig,
            Err(err) => return OrderResponse::reject(format!("network_error: signer failed: {err}")),
        };

        let response = self.runtime.block_on(self.rest.post_exchange(action, nonce, signature));
        let response = match response {
            Ok(value) => value,
            Err(err) => return Self::report_network_error(err),
        };

        if let Some(err) = rest::exchange_error(&response) {
            return OrderResponse::reject(err);
        }

        let oid = Self::extract_oid(&response).unwrap_or(0);
        self.orders.lock().insert(request.cl_id.clone(), OrderLocator { coin, oid });
        OrderResponse::ok(oid.to_string(), "placed")
    }

    fn cancel_order(
        &self,
        cl_id: &str,
        symbol: Option<&str>,
        exchange_order_id: Option<&str>,
    ) -> OrderResponse {
        let locator = self.orders.lock().remove(cl_id);
        let (coin, oid) = match (exchange_order_id.and_then(|s| s.parse::<u64>().ok()), &locator) {
            (Some(oid), _) => (symbol.map(symbol_to_coin).or_else(|| locator.as_ref().map(|l| l.coin.clone())), oid),
            (None, Some(l)) => (Some(l.coin.clone()), l.oid),
            (None, None) => return OrderResponse::reject(format!("order {cl_id} not found")),
        };
        let Some(coin) = coin else {
            return OrderResponse::reject(format!("order {cl_id} not found"));
        };
        let Some(asset_index) = self.asset_index(&coin) else {
            return OrderResponse::reject(format!("venue_reject: unknown coin {coin}"));
        };

        let action = json!({
            "type": "cancel",
            "cancels": [{"a": asset_index, "o": oid}],
        });
        let nonce = now_millis();
        let signature = match self.signer.sign(&action, nonce) {
            Ok(sig) => sig,
            Err(err) => return OrderResponse::reject(format!("network_error: signer failed: {err}")),
        };

        let response = self.runtime.block_on(self.rest.post_exchange(action, nonce, signature));
        match response {
            Ok(value) => match rest::exchange_error(&value) {
                Some(err) => OrderResponse::reject(err),
                None => OrderResponse::ok(oid.to_string(), "canceled"),
            },
            Err(err) => Self::report_network_error(err),
        }
    }

    fn modify_order(
        &self,
        cl_id: &str,
        new_size: Option<&str>,
        new_price: Option<&str>,
    ) -> OrderResponse {
        let Some(locator_oid_coin) = self.orders.lock().get(cl_id).map(|l| (l.coin.clone(), l.oid)) else {
            return OrderResponse::reject(format!("order {cl_id} not found"));
        };
        let (coin, oid) = locator_oid_coin;
        let Some(asset_index) = self.asset_index(&coin) else {
            return OrderResponse::reject(format!("venue_reject: unknown coin {coin}"));
        };
        let sz_decimals = self.sz_decimals(asset_index);
        let size = new_size
            .map(mapping::trim_decimal_string)
            .unwrap_or_else(|| format!("{:.*}", sz_decimals as usize, 0.0));
        let price = new_price.map(mapping::trim_decimal_string).unwrap_or_default();

        let action = json!({
            "type": "modify",
            "modifies": [{
                "oid": oid,
                "order": {"a": asset_index, "p": price, "s": size, "c": cl_id},
            }],
        });
        let nonce = now_millis();
        let signature = match self.signer.sign(&action, nonce) {
            Ok(sig) => sig,
            Err(err) => return OrderResponse::reject(format!("network_error: signer failed: {err}")),
        };

        let response = self.runtime.block_on(self.rest.post_exchange(action, nonce, signature));
        match response {
            Ok(value) => match rest::exchange_error(&value) {
                Some(err) => OrderResponse::reject(err),
                None => OrderResponse::ok(oid.to_string(), "replaced"),
            },
            Err(err) => Self::report_network_error(err),
        }
    }

    fn query_order(&self, cl_id: &str) -> OrderResponse {
        let Some((coin, oid)) = self.orders.lock().get(cl_id).map(|l| (l.coin.clone(), l.oid)) else {
            return OrderResponse::reject(format!("order {cl_id} not found"));
        };
        let payload = json!({"type": "orderStatus", "user": self.config.user_address, "oid": oid});
        let response = self.runtime.block_on(self.rest.post_info(&payload));
        match response {
            Ok(value) => {
                let status = value
                    .pointer("/order/status")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                if status == "unknown" {
                    OrderResponse::reject(format!("order {cl_id} not found"))
                } else {
                    OrderResponse::ok(oid.to_string(), status)
                }
            }
            Err(err) => Self::report_network_error(err),
        }
    }

    /// Hyperliquid exposes a single, unified perpetuals market, not the
    /// linear/inverse/spot split the engine's rehydration sweep assumes —
    /// this adapter only answers the `linear` sweep and returns empty for
    /// the other two categories to avoid querying the venue three times
    /// for the same result.
    fn list_open_orders(
        &self,
        category: Option<&str>,
        _symbol: Option<&str>,
        _settle: Option<&str>,
        _base_coin: Option<&str>,
    ) -> Vec<OpenOrder> {
        if category.is_some() && category != Some("linear") {
            return Vec::new();
        }

        let payload = json!({"type": "openOrders", "user": self.config.user_address});
        let response = self.runtime.block_on(self.rest.post_info(&payload));
        let Ok(Value::Array(items)) = response else {
            return Vec::new();
        };

        let mut open_orders = Vec::new();
        for item in items {
            let (Some(coin), Some(oid), Some(cl_id)) = (
                item.get("coin").and_then(|v| v.as_str()).map(str::to_string),
                item.get("oid").and_then(|v| v.as_u64()),
                item.get("cloid").and_then(|v| v.as_str()).map(str::to_string),
            ) else {
                continue;
            };
            let side = match item.get("side").and_then(|v| v.as_str()) {
                Some("B") => "buy",
                Some("A") => "sell",
                other => other.unwrap_or("buy"),
            };
            let size: Decimal = item
                .get("sz")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse().ok())
                .unwrap_or(Decimal::ZERO);
            let price: Decimal = item
                .get("limitPx")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse().ok())
                .unwrap_or(Decimal::ZERO);

            self.orders.lock().insert(cl_id.clone(), OrderLocator { coin: coin.clone(), oid });
            open_orders.push(OpenOrder {
                cl_id,
                exchange_order_id: oid.to_string(),
                symbol: coin_to_symbol(&coin),
                side: side.to_string(),
                size,
                price,
                status: "open".to_string(),
            });
        }
        open_orders
    }

    fn set_order_update_callback(&self, callback: OrderUpdateCallback) {
        *self.ws_callbacks.order_update.lock() = Some(callback);
    }

    fn set_fill_callback(&self, callback: FillCallback) {
        *self.ws_callbacks.fill.lock() = Some(callback);
    }

    fn set_error_callback(&self, callback: ErrorCallback) {
        *self.error_cb.lock() = Some(callback.clone());
        *self.ws_callbacks.error.lock() = Some(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_and_coin_conversions_round_trip() {
        assert_eq!(symbol_to_coin("BTC-USD-PERP"), "BTC");
        assert_eq!(coin_to_symbol("BTC"), "BTC-USD-PERP");
    }

    #[test]
    fn token_bucket_exhausts_then_refills() {
        let bucket = TokenBucket::new(1.0, 1000.0);
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
        std::thread::sleep(Duration::from_millis(5));
        assert!(bucket.try_acquire());
    }

    #[test]
    fn extract_oid_reads_resting_order_id() {
        let response = json!({
            "status": "ok",
            "response": {"data": {"statuses": [{"resting": {"oid": 42}}]}}
        });
        assert_eq!(HyperliquidAdapter::extract_oid(&response), Some(42));
    }

    #[test]
    fn extract_oid_reads_filled_order_id() {
        let response = json!({
            "status": "ok",
            "response": {"data": {"statuses": [{"filled": {"oid": 7, "totalSz": "0.01"}}]}}
        });
        assert_eq!(HyperliquidAdapter::extract_oid(&response), Some(7));
    }
}
