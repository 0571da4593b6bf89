//! State shared between the Receiver, Publisher, Stats, and adapter
//! callback-dispatch paths.

use crate::adapter::VenueRouter;
use crate::monitoring::ExecutionMetrics;
use crate::tracker::{OrderPool, OrderTracker};
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;

use super::publish_queue::PublishQueue;

/// Running min/max/sum/count for end-to-end latency, read by the Stats
/// thread and reset each tick (spec.md §4.H "Latency measurement").
#[derive(Default)]
pub struct LatencyAccumulator {
    pub min_ns: AtomicU64,
    pub max_ns: AtomicU64,
    pub sum_ns: AtomicU64,
    pub count: AtomicU64,
}

impl LatencyAccumulator {
    pub fn record(&self, latency_ns: u64) {
        self.sum_ns.fetch_add(latency_ns, std::sync::atomic::Ordering::Relaxed);
        self.count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.max_ns.fetch_max(latency_ns, std::sync::atomic::Ordering::Relaxed);
        // min starts at 0; first sample must seed it rather than get
        // clamped low by the initial zero.
        loop {
            let current = self.min_ns.load(std::sync::atomic::Ordering::Relaxed);
            if current != 0 && current <= latency_ns {
                break;
            }
            if self
                .min_ns
                .compare_exchange_weak(
                    current,
                    latency_ns,
                    std::sync::atomic::Ordering::Relaxed,
                    std::sync::atomic::Ordering::Relaxed,
                )
                .is_ok()
            {
                break;
            }
        }
    }

    /// Snapshot current values and reset for the next interval.
    pub fn take_snapshot(&self) -> (u64, u64, u64, u64) {
        let min = self.min_ns.swap(0, std::sync::atomic::Ordering::Relaxed);
        let max = self.max_ns.swap(0, std::sync::atomic::Ordering::Relaxed);
        let sum = self.sum_ns.swap(0, std::sync::atomic::Ordering::Relaxed);
        let count = self.count.swap(0, std::sync::atomic::Ordering::Relaxed);
        (min, max, sum, count)
    }
}

pub struct EngineShared {
    pub router: VenueRouter,
    pub tracker: OrderTracker,
    pub order_pool: OrderPool,
    pub publish_queue: PublishQueue,
    pub metrics: Arc<ExecutionMetrics>,
    pub latency: LatencyAccumulator,
    pub shutdown: AtomicBool,
    pub orders_received: AtomicU64,
    pub publish_queue_high_water: AtomicU64,
}

impl EngineShared {
    pub fn new(router: VenueRouter, metrics: ExecutionMetrics) -> Self {
        Self {
            router,
            tracker: OrderTracker::new(),
            order_pool: OrderPool::new(),
            publish_queue: PublishQueue::new(),
            metrics: Arc::new(metrics),
            latency: LatencyAccumulator::default(),
            shutdown: AtomicBool::new(false),
            orders_received: AtomicU64::new(0),
            publish_queue_high_water: AtomicU64::new(0),
        }
    }

    pub fn note_publish_queue_depth(&self) {
        let depth = self.publish_queue.len() as u64;
        let mut current = self.publish_queue_high_water.load(std::sync::atomic::Ordering::Relaxed);
        while depth > current {
            match self.publish_queue_high_water.compare_exchange_weak(
                current,
                depth,
                std::sync::atomic::Ordering::Relaxed,
                std::sync::atomic::Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }
}
