//! Stats thread: on a configured interval, logs throughput/latency/occupancy
//! counters and resets the latency accumulator for the next window
//! (spec.md §4.H).

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use super::shared::EngineShared;

/// One tick of the Stats loop, pulled out so tests can call it directly
/// without sleeping.
pub fn tick(shared: &EngineShared) {
    let (min_ns, max_ns, sum_ns, count) = shared.latency.take_snapshot();
    let avg_ns = if count > 0 { sum_ns / count } else { 0 };

    let pool_stats = shared.order_pool.stats();
    shared.metrics.pool_occupancy.set(shared.order_pool.in_use() as i64);
    shared.metrics.pool_peak.set(pool_stats.peak as i64);

    let queue_high_water = shared.publish_queue_high_water.swap(0, Ordering::Relaxed);
    shared.metrics.publish_queue_high_water.set(queue_high_water as i64);

    tracing::info!(
        orders_received = shared.orders_received.load(Ordering::Relaxed),
        min_latency_ns = min_ns,
        avg_latency_ns = avg_ns,
        max_latency_ns = max_ns,
        pool_occupancy = shared.order_pool.in_use(),
        pool_peak = pool_stats.peak,
        publish_queue_high_water = queue_high_water,
        queue_full_count = shared.metrics.queue_full_count.get(),
        pending = shared.tracker.pending_len(),
        processed = shared.tracker.processed_len(),
        "execution core stats"
    );
}

/// Runs the Stats loop until `shared.shutdown` flips, logging one tick
/// every `interval`.
pub fn run(shared: Arc<EngineShared>, interval: Duration) {
    while !shared.shutdown.load(Ordering::Relaxed) {
        std::thread::sleep(interval);
        if shared.shutdown.load(Ordering::Relaxed) {
            break;
        }
        tick(&shared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::VenueRouter;
    use crate::monitoring::ExecutionMetrics;

    #[test]
    fn tick_resets_latency_accumulator() {
        let router = VenueRouter::new();
        let shared = EngineShared::new(router, ExecutionMetrics::new().unwrap());
        shared.latency.record(100);
        shared.latency.record(300);
        tick(&shared);
        let (min_ns, max_ns, sum_ns, count) = shared.latency.take_snapshot();
        assert_eq!((min_ns, max_ns, sum_ns, count), (0, 0, 0, 0));
    }

    #[test]
    fn tick_reports_pool_occupancy() {
        let router = VenueRouter::new();
        let shared = EngineShared::new(router, ExecutionMetrics::new().unwrap());
        let _guard = shared.order_pool.allocate().unwrap();
        tick(&shared);
        assert_eq!(shared.metrics.pool_occupancy.get(), 1);
        assert_eq!(shared.metrics.pool_peak.get(), 1);
    }
}
