//! Private WebSocket stream consumer (spec.md §4.I).
//!
//! Subscribes to `orderUpdates`, `userEvents`, and `userFills`; parses each
//! message into an `OrderUpdate` or `FillData` and hands it to the
//! engine's callbacks. Reconnects on socket error or idle timeout with
//! exponential backoff (100ms doubling to a 5s cap, per spec.md §4.I).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

use crate::adapter::{ErrorCallback, FillCallback, FillData, OrderUpdate, OrderUpdateCallback};
use crate::resilience::{BackoffConfig, ExponentialBackoff};

const SUBSCRIBED_CHANNELS: &[&str] = &["orderUpdates", "userEvents", "userFills"];

fn reconnect_backoff() -> BackoffConfig {
    BackoffConfig {
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_secs(5),
        multiplier: 2.0,
        max_retries: None,
        jitter_factor: 0.0,
    }
}

/// Callback slots the WS reader dispatches into. Owned by the adapter,
/// shared with the reader task via `Arc`.
pub struct WsCallbacks {
    pub order_update: parking_lot::Mutex<Option<OrderUpdateCallback>>,
    pub fill: parking_lot::Mutex<Option<FillCallback>>,
    pub error: parking_lot::Mutex<Option<ErrorCallback>>,
}

impl WsCallbacks {
    pub fn new() -> Self {
        Self {
            order_update: parking_lot::Mutex::new(None),
            fill: parking_lot::Mutex::new(None),
            error: parking_lot::Mutex::new(None),
        }
    }

    fn dispatch_order_update(&self, update: OrderUpdate) {
        if let Some(cb) = self.order_update.lock().as_ref() {
            cb(update);
        }
    }

    fn dispatch_fill(&self, fill: FillData) {
        if let Some(cb) = self.fill.lock().as_ref() {
            cb(fill);
        }
    }

    fn dispatch_error(&self, message: String) {
        if let Some(cb) = self.error.lock().as_ref() {
            cb(message);
        }
    }
}

impl Default for WsCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

fn decimal_field(value: &Value, key: &str) -> Option<Decimal> {
    match value.get(key)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// One order-lifecycle item from the `orderUpdates` channel.
fn parse_order_update(item: &Value) -> Option<OrderUpdate> {
    let order = item.get("order").unwrap_or(item);
    let cl_id = string_field(order, "cloid").or_else(|| string_field(item, "cloid"))?;
    let exchange_order_id = order
        .get("oid")
        .and_then(|v| v.as_u64())
        .map(|oid| oid.to_string());
    let raw_status = string_field(item, "status").unwrap_or_else(|| "open".to_string());
    let raw_reason = string_field(item, "statusReason").unwrap_or_default();

    Some(OrderUpdate {
        cl_id,
        exchange_order_id,
        raw_status,
        raw_reason,
        price: decimal_field(order, "limitPx"),
        size: decimal_field(order, "sz"),
        filled_size: decimal_field(order, "filledSz"),
    })
}

/// One fill item from the `userFills` channel.
fn parse_fill(item: &Value) -> Option<FillData> {
    let cl_id = string_field(item, "cloid")?;
    let exchange_order_id = item.get("oid").and_then(|v| v.as_u64())?.to_string();
    let exec_id = string_field(item, "tid").unwrap_or_else(|| format!("{exchange_order_id}-fill"));
    let symbol = super::coin_to_symbol(&string_field(item, "coin")?);
    let price = decimal_field(item, "px")?;
    let size = decimal_field(item, "sz")?;
    let fee_amount = decimal_field(item, "fee").unwrap_or(Decimal::ZERO);
    let fee_currency = string_field(item, "feeToken").unwrap_or_else(|| "USDC".to_string());
    let liquidity = if item.get("crossed").and_then(|v| v.as_bool()).unwrap_or(false) {
        "taker"
    } else {
        "maker"
    };

    Some(FillData {
        cl_id,
        exchange_order_id,
        exec_id,
        symbol,
        price,
        size,
        fee_currency,
        fee_amount,
        liquidity: liquidity.to_string(),
        tags: std::collections::HashMap::new(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum WsEvent {
    OrderUpdate(OrderUpdate),
    Fill(FillData),
    Ignored,
}

impl PartialEq for OrderUpdate {
    fn eq(&self, other: &Self) -> bool {
        self.cl_id == other.cl_id
            && self.exchange_order_id == other.exchange_order_id
            && self.raw_status == other.raw_status
    }
}

impl PartialEq for FillData {
    fn eq(&self, other: &Self) -> bool {
        self.cl_id == other.cl_id && self.exec_id == other.exec_id
    }
}

/// Parses one text frame into zero or more events. A frame carries a
/// `channel` name and a `data` payload whose shape depends on it.
pub fn parse_message(text: &str) -> Vec<WsEvent> {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return vec![WsEvent::Ignored];
    };
    let channel = value.get("channel").and_then(|v| v.as_str()).unwrap_or("");
    let data = value.get("data");

    match channel {
        "orderUpdates" => data
            .and_then(|d| d.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(parse_order_update)
                    .map(WsEvent::OrderUpdate)
                    .collect()
            })
            .unwrap_or_else(|| vec![WsEvent::Ignored]),
        "userFills" => {
            let fills = data.and_then(|d| d.get("fills")).and_then(|f| f.as_array());
            fills
                .map(|items| items.iter().filter_map(parse_fill).map(WsEvent::Fill).collect())
                .unwrap_or_else(|| vec![WsEvent::Ignored])
        }
        _ => vec![WsEvent::Ignored],
    }
}

fn subscribe_message(user_address: &str, channel: &str) -> Message {
    Message::Text(
        serde_json::json!({
            "method": "subscribe",
            "subscription": {"type": channel, "user": user_address},
        })
        .to_string(),
    )
}

/// Runs the connect/subscribe/read loop until `shutdown` is set. Exits
/// only on shutdown; transport errors and idle timeouts trigger a
/// reconnect with backoff rather than returning.
pub async fn run(
    ws_url: String,
    user_address: String,
    idle_timeout: Duration,
    callbacks: Arc<WsCallbacks>,
    shutdown: Arc<AtomicBool>,
) {
    let mut backoff = ExponentialBackoff::with_config(reconnect_backoff());

    while !shutdown.load(Ordering::Relaxed) {
        match tokio_tungstenite::connect_async(&ws_url).await {
            Ok((mut stream, _response)) => {
                backoff.reset();
                for channel in SUBSCRIBED_CHANNELS {
                    if stream.send(subscribe_message(&user_address, channel)).await.is_err() {
                        callbacks.dispatch_error(format!("failed to subscribe to {channel}"));
                        break;
                    }
                }

                loop {
                    if shutdown.load(Ordering::Relaxed) {
                        return;
                    }
                    match tokio::time::timeout(idle_timeout, stream.next()).await {
                        Ok(Some(Ok(Message::Text(text)))) => {
                            for event in parse_message(&text) {
                                match event {
                                    WsEvent::OrderUpdate(update) => callbacks.dispatch_order_update(update),
                                    WsEvent::Fill(fill) => callbacks.dispatch_fill(fill),
                                    WsEvent::Ignored => {}
                                }
                            }
                        }
                        Ok(Some(Ok(_))) => {}
                        Ok(Some(Err(err))) => {
                            callbacks.dispatch_error(format!("ws read error: {err}"));
                            break;
                        }
                        Ok(None) => {
                            callbacks.dispatch_error("ws stream closed".to_string());
                            break;
                        }
                        Err(_) => {
                            callbacks.dispatch_error("ws idle watchdog expired".to_string());
                            break;
                        }
                    }
                }
            }
            Err(err) => {
                callbacks.dispatch_error(format!("ws connect failed: {err}"));
            }
        }

        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        if let Some(delay) = backoff.next_delay() {
            tokio::time::sleep(delay).await;
        }
    }
}
