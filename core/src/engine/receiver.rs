//! Receiver thread: sole consumer of the ingress PULL socket, sole writer
//! of "new" Pending/Processed entries, sole allocator from the order pool
//! (spec.md §4.H, §5).

use std::sync::Arc;
use std::time::Duration;

use crate::adapter::{Adapter, OrderRequest};
use crate::dto::codec::{parse_order, try_extract_cl_id, write_report};
use crate::dto::order::{Action, ExecutionOrder};
use crate::dto::report::ExecutionReport;
use crate::normalize::{map_reason, to_hyphen, ReasonCode};
use crate::tracker::{reserve_slot, DedupeDecision, InFlightOrder};

use super::publish_queue::{PublishMessage, Topic};
use super::shared::EngineShared;

/// Non-blocking poll interval when the ingress socket has nothing queued.
pub const RECEIVER_IDLE_SPIN: Duration = Duration::from_micros(50);

/// Parses and dispatches one ingress frame. Returns normally whether the
/// order was accepted, rejected, or dropped as a duplicate — every path
/// either enqueues a report or records why none was sent.
pub fn process_message(shared: &EngineShared, bytes: &[u8]) {
    let receive_ts_ns = crate::timing::now_ns();
    shared.orders_received.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    shared.metrics.orders_received.inc();

    let order = match parse_order(bytes) {
        Ok(order) => order,
        Err(_) => {
            let cl_id = try_extract_cl_id(bytes).unwrap_or_default();
            if !cl_id.is_empty() {
                publish_synthetic_rejection(shared, &cl_id, "", ReasonCode::InvalidParams, "malformed ingress message", receive_ts_ns);
            }
            shared.metrics.record_reject(ReasonCode::InvalidParams.as_str());
            return;
        }
    };

    let venue = order.venue_key();
    let Some(adapter) = shared.router.route(&venue) else {
        publish_synthetic_rejection(
            shared,
            &order.cl_id,
            &venue,
            ReasonCode::InvalidParams,
            "unknown venue",
            receive_ts_ns,
        );
        shared.metrics.record_reject(ReasonCode::InvalidParams.as_str());
        return;
    };

    match order.action {
        Action::Place => handle_place(shared, adapter.as_ref(), &venue, &order, receive_ts_ns),
        Action::Cancel => handle_cancel(shared, adapter.as_ref(), &venue, &order, receive_ts_ns),
        Action::Replace => handle_replace(shared, adapter.as_ref(), &venue, &order, receive_ts_ns),
    }

    shared.tracker.record_processed(&order.cl_id, receive_ts_ns);
}

fn handle_place(
    shared: &EngineShared,
    adapter: &dyn Adapter,
    venue: &str,
    order: &ExecutionOrder,
    receive_ts_ns: u64,
) {
    match shared.tracker.check_place_dedupe(&order.cl_id, receive_ts_ns) {
        DedupeDecision::DuplicatePlace => {
            tracing::warn!(cl_id = %order.cl_id, "duplicate place dropped");
            return;
        }
        DedupeDecision::Allow => {}
    }

    let Some(slot) = reserve_slot(&shared.order_pool) else {
        publish_synthetic_rejection(
            shared,
            &order.cl_id,
            venue,
            ReasonCode::VenueReject,
            "order pool exhausted",
            receive_ts_ns,
        );
        shared.metrics.record_reject(ReasonCode::VenueReject.as_str());
        return;
    };
    shared.metrics.pool_occupancy.set(shared.order_pool.in_use() as i64);

    let details = &order.details;
    let symbol = details.symbol.clone().unwrap_or_default();
    let normalized_symbol = to_hyphen(&symbol, order.product_type.is_perpetual()).unwrap_or(symbol.clone());

    let request = OrderRequest {
        cl_id: order.cl_id.clone(),
        symbol: normalized_symbol.clone(),
        side: details.side.clone().unwrap_or_default().to_lowercase(),
        order_type: details.order_type.clone().unwrap_or_default().to_lowercase(),
        time_in_force: details.time_in_force.clone().unwrap_or_default().to_lowercase(),
        price: details.price.map(|p| p.normalize().to_string()),
        size: details.size.map(|s| s.normalize().to_string()).unwrap_or_default(),
        stop_price: details.stop_price.map(|p| p.normalize().to_string()),
        reduce_only: details.reduce_only,
    };

    let response = adapter.place_order(request);
    if response.success {
        let mut inflight = InFlightOrder::new(&order.cl_id, venue, &normalized_symbol, receive_ts_ns)
            .with_slot(slot)
            .with_tags(order.tags.clone());
        inflight.exchange_order_id = response.exchange_order_id.clone();
        shared.tracker.insert_pending(&order.cl_id, inflight);

        publish_report(
            shared,
            &order.cl_id,
            crate::normalize::CanonicalStatus::Accepted,
            response.exchange_order_id,
            ReasonCode::Ok,
            "Order placed",
            venue,
            order.tags.clone(),
            receive_ts_ns,
        );
    } else {
        drop(slot);
        let reason = map_reason(venue, &response.message);
        publish_synthetic_rejection(shared, &order.cl_id, venue, reason, &response.message, receive_ts_ns);
        shared.metrics.record_reject(reason.as_str());
    }
}

fn handle_cancel(
    shared: &EngineShared,
    adapter: &dyn Adapter,
    venue: &str,
    order: &ExecutionOrder,
    receive_ts_ns: u64,
) {
    let target_cl_id = order
        .details
        .cancel
        .cancel_cl_id_to_cancel
        .clone()
        .unwrap_or_else(|| order.cl_id.clone());

    let pending = shared.tracker.get_pending(&target_cl_id);
    let symbol = order
        .details
        .cancel
        .symbol
        .clone()
        .or_else(|| pending.as_ref().map(|p| p.symbol.clone()));
    let exchange_order_id = order
        .details
        .cancel
        .exchange_order_id
        .clone()
        .or_else(|| pending.as_ref().and_then(|p| p.exchange_order_id.clone()));

    let response = adapter.cancel_order(&target_cl_id, symbol.as_deref(), exchange_order_id.as_deref());

    if response.success || response.is_not_found() {
        shared.tracker.remove_pending(&target_cl_id);
        publish_report(
            shared,
            &target_cl_id,
            crate::normalize::CanonicalStatus::Canceled,
            exchange_order_id,
            ReasonCode::Ok,
            "Order canceled",
            venue,
            order.tags.clone(),
            receive_ts_ns,
        );
    } else {
        let reason = map_reason(venue, &response.message);
        publish_synthetic_rejection(shared, &target_cl_id, venue, reason, &response.message, receive_ts_ns);
        shared.metrics.record_reject(reason.as_str());
    }
}

fn handle_replace(
    shared: &EngineShared,
    adapter: &dyn Adapter,
    venue: &str,
    order: &ExecutionOrder,
    receive_ts_ns: u64,
) {
    let target_cl_id = order
        .details
        .replace
        .replace_cl_id_to_replace
        .clone()
        .unwrap_or_else(|| order.cl_id.clone());

    let new_size = order.details.replace.new_size.map(|s| s.normalize().to_string());
    let new_price = order.details.replace.new_price.map(|p| p.normalize().to_string());

    let response = adapter.modify_order(&target_cl_id, new_size.as_deref(), new_price.as_deref());

    if response.success {
        publish_report(
            shared,
            &target_cl_id,
            crate::normalize::CanonicalStatus::Replaced,
            response.exchange_order_id,
            ReasonCode::Ok,
            "Order replaced",
            venue,
            order.tags.clone(),
            receive_ts_ns,
        );
    } else {
        let reason = map_reason(venue, &response.message);
        publish_synthetic_rejection(shared, &target_cl_id, venue, reason, &response.message, receive_ts_ns);
        shared.metrics.record_reject(reason.as_str());
    }
}

#[allow(clippy::too_many_arguments)]
fn publish_report(
    shared: &EngineShared,
    cl_id: &str,
    status: crate::normalize::CanonicalStatus,
    exchange_order_id: Option<String>,
    reason_code: ReasonCode,
    reason_text: &str,
    venue: &str,
    mut tags: std::collections::HashMap<String, String>,
    receive_ts_ns: u64,
) {
    tags.insert("venue".to_string(), venue.to_string());
    let report = ExecutionReport {
        version: 1,
        cl_id: cl_id.to_string(),
        status,
        exchange_order_id,
        reason_code: reason_code.as_str().to_string(),
        reason_text: reason_text.to_string(),
        ts_ns: crate::timing::now_ns(),
        tags,
    };
    let message = PublishMessage {
        topic: Topic::ExecReport,
        payload: write_report(&report),
        receive_ts_ns,
    };
    match shared.publish_queue.push(message) {
        Ok(()) => {
            shared.note_publish_queue_depth();
            shared.metrics.reports_published.inc();
        }
        Err(_) => {
            shared.metrics.queue_full_count.inc();
            tracing::warn!(cl_id, "publish queue full, dropping report");
        }
    }
}

fn publish_synthetic_rejection(
    shared: &EngineShared,
    cl_id: &str,
    venue: &str,
    reason_code: ReasonCode,
    reason_text: &str,
    receive_ts_ns: u64,
) {
    publish_report(
        shared,
        cl_id,
        crate::normalize::CanonicalStatus::Rejected,
        None,
        reason_code,
        reason_text,
        venue,
        std::collections::HashMap::new(),
        receive_ts_ns,
    );
}

/// Runs the Receiver loop until `shared.shutdown` flips. Pulled out of
/// `ExecutionEngine::start` so it can be unit-exercised with a plain
/// `zmq::Socket` built against an in-process `inproc://` endpoint.
pub fn run(shared: Arc<EngineShared>, socket: zmq::Socket) {
    let mut msg = zmq::Message::new();
    while !shared.shutdown.load(std::sync::atomic::Ordering::Relaxed) {
        match socket.recv(&mut msg, zmq::DONTWAIT) {
            Ok(()) => process_message(&shared, &msg),
            Err(zmq::Error::EAGAIN) => std::thread::sleep(RECEIVER_IDLE_SPIN),
            Err(err) => {
                tracing::error!(%err, "ingress recv error");
                std::thread::sleep(RECEIVER_IDLE_SPIN);
            }
        }
    }
}
