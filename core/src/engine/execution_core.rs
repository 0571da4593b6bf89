//! `ExecutionEngine`: owns the ZMQ context, wires an adapter's callbacks
//! into the dispatch logic, rehydrates open orders on connect, and runs the
//! Receiver / Publisher / Stats threads (spec.md §4.H, §5).

use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use anyhow::{Context, Result};

use crate::adapter::{Adapter, FillData, OrderUpdate, VenueRouter};
use crate::config::RuntimeConfig;
use crate::monitoring::ExecutionMetrics;
use crate::timing::affinity::optimize_for_hft;
use crate::tracker::InFlightOrder;

use super::callbacks;
use super::publisher;
use super::receiver;
use super::shared::EngineShared;
use super::stats;

/// Product categories rehydration sweeps across, per spec.md §4.G.
const REHYDRATION_CATEGORIES: &[&str] = &["linear", "inverse", "spot"];

pub struct ExecutionEngine {
    shared: Arc<EngineShared>,
    venue: String,
    config: RuntimeConfig,
    context: zmq::Context,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl ExecutionEngine {
    /// Builds the engine around a single adapter, registering it as the
    /// only routable venue. Multi-venue deployments would register more
    /// than one adapter into the same router before constructing this.
    pub fn new(config: RuntimeConfig, adapter: Arc<dyn Adapter>) -> Result<Self> {
        let venue = adapter.name().to_lowercase();
        let mut router = VenueRouter::new();
        router.register_adapter(adapter.clone());

        let metrics = ExecutionMetrics::new().context("failed to construct metrics registry")?;
        let shared = Arc::new(EngineShared::new(router, metrics));

        wire_callbacks(&shared, &venue, adapter.clone());

        Ok(Self {
            shared,
            venue,
            config,
            context: zmq::Context::new(),
            threads: Mutex::new(Vec::new()),
        })
    }

    pub fn shared(&self) -> &Arc<EngineShared> {
        &self.shared
    }

    /// Handle to the metrics registry, for binaries that want to run the
    /// Prometheus HTTP server alongside this engine.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        self.shared.metrics.clone()
    }

    /// Connects the adapter, rehydrates open orders, binds sockets, and
    /// starts the Receiver/Publisher/Stats threads. Returns once all
    /// threads are spawned; the threads run until `shutdown()` is called.
    pub fn start(&self) -> Result<()> {
        let adapter = self
            .shared
            .router
            .route(&self.venue)
            .context("adapter not registered for its own venue key")?;

        if !adapter.connect() {
            tracing::warn!(venue = %self.venue, "adapter connect() reported failure, continuing degraded");
        } else {
            rehydrate(&self.shared, adapter.as_ref(), &self.venue);
        }

        let ingress = self
            .context
            .socket(zmq::PULL)
            .context("failed to create ingress socket")?;
        ingress
            .bind(&self.config.ingress_endpoint)
            .with_context(|| format!("failed to bind ingress socket {}", self.config.ingress_endpoint))?;

        let egress = self
            .context
            .socket(zmq::PUB)
            .context("failed to create egress socket")?;
        egress
            .bind(&self.config.egress_endpoint)
            .with_context(|| format!("failed to bind egress socket {}", self.config.egress_endpoint))?;

        let mut threads = self.threads.lock().expect("threads mutex poisoned");

        let receiver_shared = self.shared.clone();
        let receiver_core = self.config.cpu_core;
        let receiver_realtime = self.config.realtime;
        threads.push(std::thread::spawn(move || {
            if let Some(core) = receiver_core {
                optimize_for_hft(core, 50);
            } else if receiver_realtime {
                tracing::warn!("realtime requested with no cpu_core pin; skipping affinity");
            }
            receiver::run(receiver_shared, ingress);
        }));

        let publisher_shared = self.shared.clone();
        let publisher_core = self.config.cpu_core.map(|c| c + 1);
        let drain_budget = std::time::Duration::from_millis(self.config.publisher_drain_timeout_ms);
        threads.push(std::thread::spawn(move || {
            if let Some(core) = publisher_core {
                optimize_for_hft(core, 50);
            }
            publisher::run(publisher_shared, egress, drain_budget);
        }));

        let stats_shared = self.shared.clone();
        let stats_interval = std::time::Duration::from_secs(self.config.stats_interval_secs);
        threads.push(std::thread::spawn(move || {
            stats::run(stats_shared, stats_interval);
        }));

        Ok(())
    }

    /// Flips the shutdown flag, disconnects the adapter, and joins every
    /// spawned thread. The Publisher drains its queue for a bounded time
    /// before the Receiver/Publisher/Stats threads exit (spec.md §5).
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::Relaxed);
        if let Some(adapter) = self.shared.router.route(&self.venue) {
            adapter.disconnect();
        }
        let mut threads = self.threads.lock().expect("threads mutex poisoned");
        for handle in threads.drain(..) {
            let _ = handle.join();
        }
    }
}

fn wire_callbacks(shared: &Arc<EngineShared>, venue: &str, adapter: Arc<dyn Adapter>) {
    let order_shared = shared.clone();
    let order_adapter = adapter.clone();
    let order_venue = venue.to_string();
    adapter.set_order_update_callback(Arc::new(move |update: OrderUpdate| {
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            callbacks::dispatch_order_update(&order_shared, order_adapter.as_ref(), &order_venue, update);
        }));
        if result.is_err() {
            tracing::error!(venue = %order_venue, "order update callback panicked, dropping");
        }
    }));

    let fill_shared = shared.clone();
    let fill_venue = venue.to_string();
    adapter.set_fill_callback(Arc::new(move |fill: FillData| {
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            callbacks::dispatch_fill(&fill_shared, &fill_venue, fill);
        }));
        if result.is_err() {
            tracing::error!(venue = %fill_venue, "fill callback panicked, dropping");
        }
    }));

    let error_venue = venue.to_string();
    adapter.set_error_callback(Arc::new(move |message: String| {
        tracing::error!(venue = %error_venue, %message, "adapter reported error");
    }));
}

/// Sweeps `list_open_orders` across the categories relevant to the venue
/// and synthesizes a Pending entry, tagged `external`, for each returned
/// order (spec.md §4.G "Rehydration").
fn rehydrate(shared: &EngineShared, adapter: &dyn Adapter, venue: &str) {
    let now_ns = crate::timing::now_ns();
    let mut count = 0usize;
    for category in REHYDRATION_CATEGORIES {
        for open_order in adapter.list_open_orders(Some(category), None, None, None) {
            let mut order = InFlightOrder::external(&open_order.cl_id, venue, &open_order.symbol, now_ns);
            order.exchange_order_id = Some(open_order.exchange_order_id.clone());
            shared.tracker.insert_pending(&open_order.cl_id, order);
            count += 1;
        }
    }
    if count > 0 {
        tracing::info!(venue, count, "rehydrated open orders into Pending");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PlaceScript, TestAdapter};

    fn test_config() -> RuntimeConfig {
        RuntimeConfig {
            ingress_endpoint: "inproc://test-ingress".to_string(),
            egress_endpoint: "inproc://test-egress".to_string(),
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

    #[test]
    fn rehydrate_populates_pending_from_open_orders() {
        let adapter = Arc::new(TestAdapter::new("hyperliquid"));
        adapter.seed_open_order(crate::adapter::OpenOrder {
            cl_id: "EXT1".to_string(),
            exchange_order_id: "X1".to_string(),
            symbol: "BTC-USDT-PERP".to_string(),
            side: "buy".to_string(),
            size: rust_decimal::Decimal::new(1, 2),
            price: rust_decimal::Decimal::new(500000, 1),
            status: "open".to_string(),
        });

        let engine = ExecutionEngine::new(test_config(), adapter).unwrap();
        let adapter = engine.shared.router.route("hyperliquid").unwrap();
        rehydrate(&engine.shared, adapter.as_ref(), "hyperliquid");

        let inflight = engine.shared.tracker.get_pending("EXT1").unwrap();
        assert!(inflight.is_external());
        assert_eq!(inflight.exchange_order_id.as_deref(), Some("X1"));
    }

    #[test]
    fn callbacks_are_wired_through_to_the_publish_queue() {
        let adapter = Arc::new(TestAdapter::new("hyperliquid"));
        adapter.push_place_script(PlaceScript::Accept { exchange_order_id: "X1".to_string() });
        let engine = ExecutionEngine::new(test_config(), adapter.clone()).unwrap();

        engine.shared.tracker.insert_pending(
            "T1",
            InFlightOrder::new("T1", "hyperliquid", "BTC-USDT-PERP", 0),
        );
        adapter.emit_order_update(OrderUpdate {
            cl_id: "T1".to_string(),
            exchange_order_id: Some("X1".to_string()),
            raw_status: "filled".to_string(),
            raw_reason: "".to_string(),
            price: None,
            size: None,
            filled_size: None,
        });

        assert!(engine.shared.publish_queue.pop().is_some());
        assert!(engine.shared.tracker.get_pending("T1").is_none());
    }
}
