//! Socket-level end-to-end tests: a real PUSH client feeds ingress, a real
//! SUB client reads egress, and a `TestAdapter` stands in for the venue.
//! Each test binds its own `tcp://127.0.0.1:<port>` pair so they can run
//! concurrently without cross-talk.

use std::sync::Arc;
use std::time::Duration;

use latentspeed_core::adapter::{Adapter, FillData, OrderUpdate};
use latentspeed_core::config::RuntimeConfig;
use latentspeed_core::testing::{PlaceScript, TestAdapter};
use latentspeed_core::ExecutionEngine;
use serde_json::Value;

fn config_for(ingress_port: u16, egress_port: u16) -> RuntimeConfig {
    RuntimeConfig {
        ingress_endpoint: format!("tcp://127.0.0.1:{ingress_port}"),
        egress_endpoint: format!("tcp://127.0.0.1:{egress_port}"),
        venue: "hyperliquid".to_string(),
        testnet: true,
        rest_timeout_secs: 5,
        ws_idle_timeout_secs: 30,
        publisher_drain_timeout_ms: 50,
        stats_interval_secs: 10,
        log_level: "info".to_string(),
        cpu_core: None,
        realtime: false,
        metrics_addr: None,
        hyperliquid: None,
    }
}

struct Harness {
    engine: ExecutionEngine,
    push: zmq::Socket,
    sub: zmq::Socket,
}

impl Harness {
    fn start(ingress_port: u16, egress_port: u16, adapter: Arc<TestAdapter>) -> Self {
        let engine = ExecutionEngine::new(config_for(ingress_port, egress_port), adapter).unwrap();
        engine.start().unwrap();

        let ctx = zmq::Context::new();
        let push = ctx.socket(zmq::PUSH).unwrap();
        push.connect(&format!("tcp://127.0.0.1:{ingress_port}")).unwrap();

        let sub = ctx.socket(zmq::SUB).unwrap();
        sub.connect(&format!("tcp://127.0.0.1:{egress_port}")).unwrap();
        sub.set_subscribe(b"").unwrap();

        // Give the PUB/SUB handshake and connect-state a moment to settle;
        // ZMQ silently drops messages sent before a subscriber has joined.
        std::thread::sleep(Duration::from_millis(200));

        Self { engine, push, sub }
    }

    fn send(&self, bytes: &[u8]) {
        self.push.send(bytes, 0).unwrap();
    }

    /// Receives one topic+payload frame pair, parsing the payload as JSON.
    fn recv_one(&self) -> (String, Value) {
        let topic = self
            .sub
            .recv_string(0)
            .unwrap()
            .unwrap();
        let payload = self.sub.recv_bytes(0).unwrap();
        (topic, serde_json::from_slice(&payload).unwrap())
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.engine.shutdown();
    }
}

const PLACE_PAYLOAD: &str = r#"{"version":1,"cl_id":"E2E-1","action":"place","venue":"hyperliquid",
    "product_type":"perpetual","details":{"symbol":"BTC-USDT-PERP","side":"buy",
    "order_type":"limit","time_in_force":"GTC","price":"50000","size":"0.01","reduce_only":false}}"#;

#[test]
fn accepted_place_is_published_over_the_real_egress_socket() {
    let adapter = Arc::new(TestAdapter::new("hyperliquid"));
    adapter.push_place_script(PlaceScript::Accept { exchange_order_id: "X1".to_string() });
    let harness = Harness::start(15601, 15602, adapter);

    harness.send(PLACE_PAYLOAD.as_bytes());

    let (topic, report) = harness.recv_one();
    assert_eq!(topic, "exec.report");
    assert_eq!(report["cl_id"], "E2E-1");
    assert_eq!(report["status"], "accepted");
    assert_eq!(report["exchange_order_id"], "X1");
}

#[test]
fn duplicate_place_produces_exactly_one_report() {
    let adapter = Arc::new(TestAdapter::new("hyperliquid"));
    adapter.push_place_script(PlaceScript::Accept { exchange_order_id: "X2".to_string() });
    let harness = Harness::start(15611, 15612, adapter);

    harness.send(PLACE_PAYLOAD.as_bytes());
    let (_, first) = harness.recv_one();
    assert_eq!(first["status"], "accepted");

    // A byte-identical resend of the same cl_id is dropped silently; confirm
    // by sending a second, distinct order and observing it arrives next.
    harness.send(PLACE_PAYLOAD.as_bytes());
    let second_payload = PLACE_PAYLOAD.replace("E2E-1", "E2E-1b");
    harness.send(second_payload.as_bytes());

    let (_, next) = harness.recv_one();
    assert_eq!(next["cl_id"], "E2E-1b");
}

#[test]
fn cancel_of_unknown_order_reports_canceled() {
    let adapter = Arc::new(TestAdapter::new("hyperliquid"));
    adapter.set_not_found(true);
    let harness = Harness::start(15621, 15622, adapter);

    let bytes = br#"{"version":1,"cl_id":"E2E-3","action":"cancel","venue":"hyperliquid",
        "product_type":"perpetual","details":{"cancel":{"cancel_cl_id_to_cancel":"GHOST"}}}"#;
    harness.send(bytes);

    let (topic, report) = harness.recv_one();
    assert_eq!(topic, "exec.report");
    assert_eq!(report["status"], "canceled");
    assert_eq!(report["cl_id"], "GHOST");
}

#[test]
fn fill_delivered_through_the_adapter_callback_reaches_the_egress_socket() {
    let adapter = Arc::new(TestAdapter::new("hyperliquid"));
    adapter.push_place_script(PlaceScript::Accept { exchange_order_id: "X4".to_string() });
    let harness = Harness::start(15631, 15632, adapter.clone());

    let place = PLACE_PAYLOAD.replace("E2E-1", "E2E-4");
    harness.send(place.as_bytes());
    let (_, accepted) = harness.recv_one();
    assert_eq!(accepted["status"], "accepted");

    adapter.emit_fill(FillData {
        cl_id: "E2E-4".to_string(),
        exchange_order_id: "X4".to_string(),
        exec_id: "F1".to_string(),
        symbol: "BTC-USDT-PERP".to_string(),
        price: rust_decimal::Decimal::new(500000, 1),
        size: rust_decimal::Decimal::new(1, 2),
        fee_currency: "USDT".to_string(),
        fee_amount: rust_decimal::Decimal::new(2, 2),
        liquidity: "taker".to_string(),
        tags: Default::default(),
    });

    let (topic, fill) = harness.recv_one();
    assert_eq!(topic, "exec.fill");
    assert_eq!(fill["cl_id"], "E2E-4");
    assert_eq!(fill["exec_id"], "F1");
    assert_eq!(fill["tags"]["execution_type"], "live");

    adapter.emit_order_update(OrderUpdate {
        cl_id: "E2E-4".to_string(),
        exchange_order_id: Some("X4".to_string()),
        raw_status: "filled".to_string(),
        raw_reason: "".to_string(),
        price: None,
        size: None,
        filled_size: None,
    });
    let (topic, report) = harness.recv_one();
    assert_eq!(topic, "exec.report");
    assert_eq!(report["status"], "filled");
    assert!(harness.engine.shared().tracker.get_pending("E2E-4").is_none());
}

#[test]
fn unknown_venue_is_rejected_over_the_wire() {
    let adapter = Arc::new(TestAdapter::new("hyperliquid"));
    let harness = Harness::start(15641, 15642, adapter);

    let bytes = br#"{"version":1,"cl_id":"E2E-5","action":"place","venue":"bybit",
        "product_type":"spot","details":{"symbol":"BTC-USDT","side":"buy","order_type":"limit","size":"1"}}"#;
    harness.send(bytes);

    let (topic, report) = harness.recv_one();
    assert_eq!(topic, "exec.report");
    assert_eq!(report["status"], "rejected");
    assert_eq!(report["reason_code"], "invalid_params");
}

#[test]
fn every_recognized_symbol_form_normalizes_to_the_same_hyphenated_pair_on_fills() {
    let adapter = Arc::new(TestAdapter::new("hyperliquid"));
    let harness = Harness::start(15651, 15652, adapter.clone());

    for (i, raw_symbol) in ["BTCUSDT", "btc-usdt", "BTC/USDT", "BTC-USDT"].iter().enumerate() {
        adapter.emit_fill(FillData {
            cl_id: format!("E2E-6-{i}"),
            exchange_order_id: format!("X6-{i}"),
            exec_id: format!("F6-{i}"),
            symbol: raw_symbol.to_string(),
            price: rust_decimal::Decimal::new(500000, 1),
            size: rust_decimal::Decimal::new(1, 2),
            fee_currency: "USDT".to_string(),
            fee_amount: rust_decimal::Decimal::new(2, 2),
            liquidity: "taker".to_string(),
            tags: Default::default(),
        });

        let (topic, fill) = harness.recv_one();
        assert_eq!(topic, "exec.fill");
        assert_eq!(fill["symbol_or_pair"], "BTC-USDT", "input form {raw_symbol} did not normalize");
    }
}
