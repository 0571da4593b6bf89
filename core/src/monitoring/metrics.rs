//! Prometheus metrics for the execution core.
//!
//! Covers what the Stats thread reports every 10s (spec.md §4.H) plus the
//! counters named explicitly by spec.md §7/§8: pool occupancy, publish
//! queue high-water mark, dropped-publish count, per-reason-code rejects.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use tracing::info;

pub struct ExecutionMetrics {
    registry: Arc<Registry>,

    pub orders_received: IntCounter,
    pub orders_rejected: IntCounterVec,
    pub reports_published: IntCounter,
    pub fills_published: IntCounter,
    pub queue_full_count: IntCounter,
    pub pool_occupancy: IntGauge,
    pub pool_peak: IntGauge,
    pub publish_queue_high_water: IntGauge,
    pub end_to_end_latency_ns: Histogram,
}

impl ExecutionMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Arc::new(Registry::new());

        let orders_received = IntCounter::new(
            "latentspeed_orders_received_total",
            "Inbound ExecutionOrder messages received",
        )?;
        let orders_rejected = IntCounterVec::new(
            Opts::new(
                "latentspeed_orders_rejected_total",
                "Rejected reports published, by reason_code",
            ),
            &["reason_code"],
        )?;
        let reports_published = IntCounter::new(
            "latentspeed_reports_published_total",
            "ExecutionReport messages published",
        )?;
        let fills_published = IntCounter::new(
            "latentspeed_fills_published_total",
            "Fill messages published",
        )?;
        let queue_full_count = IntCounter::new(
            "latentspeed_publish_queue_full_total",
            "Publish-side drops due to a full SPSC queue",
        )?;
        let pool_occupancy = IntGauge::new(
            "latentspeed_order_pool_occupancy",
            "Order pool slots currently in use",
        )?;
        let pool_peak = IntGauge::new(
            "latentspeed_order_pool_peak",
            "Order pool peak concurrent usage",
        )?;
        let publish_queue_high_water = IntGauge::new(
            "latentspeed_publish_queue_high_water",
            "Publish queue high-water mark since last stats tick",
        )?;
        let end_to_end_latency_ns = Histogram::with_opts(HistogramOpts::new(
            "latentspeed_end_to_end_latency_ns",
            "Receive-to-publish latency in nanoseconds",
        ))?;

        registry.register(Box::new(orders_received.clone()))?;
        registry.register(Box::new(orders_rejected.clone()))?;
        registry.register(Box::new(reports_published.clone()))?;
        registry.register(Box::new(fills_published.clone()))?;
        registry.register(Box::new(queue_full_count.clone()))?;
        registry.register(Box::new(pool_occupancy.clone()))?;
        registry.register(Box::new(pool_peak.clone()))?;
        registry.register(Box::new(publish_queue_high_water.clone()))?;
        registry.register(Box::new(end_to_end_latency_ns.clone()))?;

        info!("execution metrics registry initialized");

        Ok(Self {
            registry,
            orders_received,
            orders_rejected,
            reports_published,
            fills_published,
            queue_full_count,
            pool_occupancy,
            pool_peak,
            publish_queue_high_water,
            end_to_end_latency_ns,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_reject(&self, reason_code: &str) {
        self.orders_rejected.with_label_values(&[reason_code]).inc();
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new().unwrap_or_else(|e| {
            tracing::error!("FATAL: failed to create metrics registry: {}", e);
            panic!("cannot create metrics registry");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_construct_without_panicking() {
        let metrics = ExecutionMetrics::new().unwrap();
        metrics.orders_received.inc();
        metrics.record_reject("invalid_params");
        assert_eq!(metrics.orders_received.get(), 1);
    }
}
