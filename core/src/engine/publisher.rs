//! Publisher thread: sole consumer of the publish queue, sole writer of
//! the egress PUB socket (spec.md §4.H, §5).

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::shared::EngineShared;

/// Idle-poll interval when the publish queue is empty.
pub const PUBLISHER_IDLE_SPIN: Duration = Duration::from_micros(50);

/// Sends one message as a two-frame ZMQ PUB: topic, then JSON payload.
/// Records end-to-end latency from the message's `receive_ts_ns`.
fn send_one(shared: &EngineShared, socket: &zmq::Socket, message: super::publish_queue::PublishMessage) {
    let now_ns = crate::timing::now_ns();
    let latency_ns = now_ns.saturating_sub(message.receive_ts_ns);
    shared.latency.record(latency_ns);
    shared.metrics.end_to_end_latency_ns.observe(latency_ns as f64);

    if let Err(err) = socket.send(message.topic.as_str(), zmq::SNDMORE) {
        tracing::error!(%err, "failed to send topic frame");
        return;
    }
    if let Err(err) = socket.send(message.payload, 0) {
        tracing::error!(%err, "failed to send payload frame");
    }
}

/// Runs the Publisher loop until `shared.shutdown` flips, then drains
/// whatever remains in the queue for up to `drain_budget` before
/// returning (spec.md §5 "Engine shutdown").
pub fn run(shared: Arc<EngineShared>, socket: zmq::Socket, drain_budget: Duration) {
    loop {
        match shared.publish_queue.pop() {
            Some(message) => send_one(&shared, &socket, message),
            None => {
                if shared.shutdown.load(Ordering::Relaxed) {
                    break;
                }
                std::thread::sleep(PUBLISHER_IDLE_SPIN);
            }
        }
    }

    let drain_deadline = Instant::now() + drain_budget;
    while Instant::now() < drain_deadline {
        match shared.publish_queue.pop() {
            Some(message) => send_one(&shared, &socket, message),
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::publish_queue::{PublishMessage, Topic};
    use super::*;
    use crate::adapter::VenueRouter;
    use crate::monitoring::ExecutionMetrics;

    #[test]
    fn shutdown_drain_flushes_queue_before_returning() {
        let router = VenueRouter::new();
        let shared = Arc::new(EngineShared::new(router, ExecutionMetrics::new().unwrap()));
        shared.shutdown.store(true, Ordering::Relaxed);
        shared
            .publish_queue
            .push(PublishMessage {
                topic: Topic::ExecReport,
                payload: b"{}".to_vec(),
                receive_ts_ns: crate::timing::now_ns(),
            })
            .unwrap();

        let ctx = zmq::Context::new();
        let socket = ctx.socket(zmq::PUB).unwrap();
        run(shared.clone(), socket, Duration::from_millis(500));

        assert!(shared.publish_queue.is_empty());
    }
}
