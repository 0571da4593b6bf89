//! Adapter callback dispatch (spec.md §4.H "Order update callback" /
//! "Fill callback").
//!
//! Both entry points may be invoked from any adapter-owned thread; they
//! touch only `EngineShared`'s internally-synchronized state (the tracker's
//! mutexes, the publish queue's producer lock, atomic counters), so no
//! additional locking is needed here.

use crate::adapter::{Adapter, FillData, OrderUpdate};
use crate::dto::codec::{write_fill, write_report};
use crate::dto::report::{ExecutionReport, Fill, Liquidity};
use crate::normalize::{map_reason, map_status, to_hyphen};
use crate::tracker::InFlightOrder;
use std::collections::HashMap;

use super::publish_queue::{PublishMessage, Topic};
use super::shared::EngineShared;

/// Handles an `OrderUpdate` delivered by `venue`'s adapter.
pub fn dispatch_order_update(shared: &EngineShared, adapter: &dyn Adapter, venue: &str, update: OrderUpdate) {
    let now_ns = crate::timing::now_ns();

    let inflight = shared
        .tracker
        .get_pending(&update.cl_id)
        .or_else(|| lazy_rehydrate(shared, adapter, venue, &update.cl_id, now_ns));

    let status = map_status(venue, &update.raw_status);
    let reason = map_reason(venue, &update.raw_reason);

    let mut tags: HashMap<String, String> =
        inflight.as_ref().map(|o| o.tags.clone()).unwrap_or_default();
    tags.insert("venue".to_string(), venue.to_string());

    let exchange_order_id = update
        .exchange_order_id
        .clone()
        .or_else(|| inflight.as_ref().and_then(|o| o.exchange_order_id.clone()));

    let report = ExecutionReport {
        version: 1,
        cl_id: update.cl_id.clone(),
        status,
        exchange_order_id,
        reason_code: reason.as_str().to_string(),
        reason_text: update.raw_reason.clone(),
        ts_ns: now_ns,
        tags,
    };

    enqueue_report(shared, &report, now_ns);

    if status.is_terminal() {
        shared.tracker.remove_pending(&update.cl_id);
    }
}

/// Handles a `FillData` delivered by `venue`'s adapter.
pub fn dispatch_fill(shared: &EngineShared, venue: &str, fill: FillData) {
    let now_ns = crate::timing::now_ns();

    let inflight = shared.tracker.get_pending(&fill.cl_id);
    let execution_type = match &inflight {
        Some(order) if !order.is_external() => "live",
        _ => "external",
    };

    let symbol_or_pair = to_hyphen(&fill.symbol, false).unwrap_or_else(|| fill.symbol.clone());
    let liquidity = if fill.liquidity.eq_ignore_ascii_case("maker") {
        Liquidity::Maker
    } else {
        Liquidity::Taker
    };

    let mut tags: HashMap<String, String> =
        inflight.as_ref().map(|o| o.tags.clone()).unwrap_or_default();
    tags.extend(fill.tags.clone());
    tags.insert("venue".to_string(), venue.to_string());
    tags.insert("execution_type".to_string(), execution_type.to_string());

    let dto = Fill {
        version: 1,
        cl_id: fill.cl_id.clone(),
        exchange_order_id: fill.exchange_order_id.clone(),
        exec_id: fill.exec_id.clone(),
        symbol_or_pair,
        price: fill.price,
        size: fill.size,
        fee_currency: fill.fee_currency.clone(),
        fee_amount: fill.fee_amount,
        liquidity,
        ts_ns: now_ns,
        tags,
    };

    enqueue_fill(shared, &dto, now_ns);
}

/// An `on_order_update` for an unknown `cl_id` queries the adapter directly
/// (spec.md §4.G "Lazy rehydration"). A live result is synthesized into
/// Pending, tagged `external`; a terminal or failed query is published once
/// with no InFlight created.
fn lazy_rehydrate(
    shared: &EngineShared,
    adapter: &dyn Adapter,
    venue: &str,
    cl_id: &str,
    now_ns: u64,
) -> Option<InFlightOrder> {
    let response = adapter.query_order(cl_id);
    if !response.success {
        return None;
    }
    let status = map_status(venue, &response.message);
    if status.is_terminal() {
        return None;
    }
    let mut order = InFlightOrder::external(cl_id, venue, "", now_ns);
    order.exchange_order_id = response.exchange_order_id;
    shared.tracker.insert_pending(cl_id, order.clone());
    Some(order)
}

fn enqueue_report(shared: &EngineShared, report: &ExecutionReport, receive_ts_ns: u64) {
    let message = PublishMessage {
        topic: Topic::ExecReport,
        payload: write_report(report),
        receive_ts_ns,
    };
    match shared.publish_queue.push(message) {
        Ok(()) => {
            shared.note_publish_queue_depth();
            shared.metrics.reports_published.inc();
        }
        Err(_) => {
            shared.metrics.queue_full_count.inc();
            tracing::warn!(cl_id = %report.cl_id, "publish queue full, dropping report");
        }
    }
}

fn enqueue_fill(shared: &EngineShared, fill: &Fill, receive_ts_ns: u64) {
    let message = PublishMessage {
        topic: Topic::ExecFill,
        payload: write_fill(fill),
        receive_ts_ns,
    };
    match shared.publish_queue.push(message) {
        Ok(()) => {
            shared.note_publish_queue_depth();
            shared.metrics.fills_published.inc();
        }
        Err(_) => {
            shared.metrics.queue_full_count.inc();
            tracing::warn!(cl_id = %fill.cl_id, "publish queue full, dropping fill");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{OpenOrder, OrderRequest, OrderResponse, VenueRouter};
    use crate::monitoring::ExecutionMetrics;
    use crate::testing::TestAdapter;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn shared_with_adapter() -> (EngineShared, Arc<TestAdapter>) {
        let adapter = Arc::new(TestAdapter::new("hyperliquid"));
        let mut router = VenueRouter::new();
        router.register_adapter(adapter.clone());
        let shared = EngineShared::new(router, ExecutionMetrics::new().unwrap());
        (shared, adapter)
    }

    #[test]
    fn terminal_update_removes_pending_and_publishes_report() {
        let (shared, adapter) = shared_with_adapter();
        shared.tracker.insert_pending(
            "T1",
            InFlightOrder::new("T1", "hyperliquid", "BTC-USDT-PERP", 0),
        );

        dispatch_order_update(
            &shared,
            adapter.as_ref(),
            "hyperliquid",
            OrderUpdate {
                cl_id: "T1".to_string(),
                exchange_order_id: Some("X1".to_string()),
                raw_status: "filled".to_string(),
                raw_reason: "".to_string(),
                price: None,
                size: None,
                filled_size: None,
            },
        );

        assert!(shared.tracker.get_pending("T1").is_none());
        let popped = shared.publish_queue.pop().unwrap();
        assert_eq!(popped.topic, Topic::ExecReport);
    }

    #[test]
    fn unknown_cl_id_lazy_rehydrates_when_adapter_reports_live() {
        let (shared, adapter) = shared_with_adapter();
        adapter.seed_open_order(OpenOrder {
            cl_id: "T9".to_string(),
            exchange_order_id: "X9".to_string(),
            symbol: "BTC-USDT-PERP".to_string(),
            side: "buy".to_string(),
            size: Decimal::new(1, 2),
            price: Decimal::new(500000, 1),
            status: "open".to_string(),
        });

        dispatch_order_update(
            &shared,
            adapter.as_ref(),
            "hyperliquid",
            OrderUpdate {
                cl_id: "T9".to_string(),
                exchange_order_id: Some("X9".to_string()),
                raw_status: "open".to_string(),
                raw_reason: "".to_string(),
                price: None,
                size: None,
                filled_size: None,
            },
        );

        let inflight = shared.tracker.get_pending("T9").unwrap();
        assert!(inflight.is_external());
    }

    #[test]
    fn unknown_cl_id_with_not_found_query_publishes_without_inflight() {
        let (shared, adapter) = shared_with_adapter();
        adapter.set_not_found(true);

        dispatch_order_update(
            &shared,
            adapter.as_ref(),
            "hyperliquid",
            OrderUpdate {
                cl_id: "GHOST".to_string(),
                exchange_order_id: None,
                raw_status: "rejected".to_string(),
                raw_reason: "".to_string(),
                price: None,
                size: None,
                filled_size: None,
            },
        );

        assert!(shared.tracker.get_pending("GHOST").is_none());
        assert!(shared.publish_queue.pop().is_some());
    }

    #[test]
    fn fill_for_engine_created_order_is_tagged_live() {
        let (shared, _adapter) = shared_with_adapter();
        shared.tracker.insert_pending(
            "T1",
            InFlightOrder::new("T1", "hyperliquid", "BTC-USDT-PERP", 0),
        );

        dispatch_fill(
            &shared,
            "hyperliquid",
            FillData {
                cl_id: "T1".to_string(),
                exchange_order_id: "X1".to_string(),
                exec_id: "F1".to_string(),
                symbol: "BTC-USDT-PERP".to_string(),
                price: Decimal::new(500000, 1),
                size: Decimal::new(1, 2),
                fee_currency: "USDT".to_string(),
                fee_amount: Decimal::new(2, 2),
                liquidity: "maker".to_string(),
                tags: HashMap::new(),
            },
        );

        let popped = shared.publish_queue.pop().unwrap();
        assert_eq!(popped.topic, Topic::ExecFill);
        let fill: Fill = serde_json::from_slice(&popped.payload).unwrap();
        assert_eq!(fill.tags.get("execution_type").map(String::as_str), Some("live"));
        assert_eq!(fill.symbol_or_pair, "BTC-USDT-PERP");
    }
}
