use crate::adapter::{
    Adapter, ErrorCallback, FillCallback, FillData, OpenOrder, OrderRequest, OrderResponse,
    OrderUpdate, OrderUpdateCallback,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

/// What the next scripted `place_order` call should return.
#[derive(Debug, Clone)]
pub enum PlaceScript {
    Accept { exchange_order_id: String },
    Reject { message: String },
}

/// A fully synchronous, scriptable stand-in for a venue adapter. Tests
/// drive it directly; `emit_order_update`/`emit_fill` call the engine's
/// registered callbacks inline, exactly as a real adapter's callback
/// thread would, but without the thread.
pub struct TestAdapter {
    name: String,
    connected: AtomicBool,
    place_script: Mutex<VecDeque<PlaceScript>>,
    cancel_not_found: AtomicBool,
    open_orders: Mutex<Vec<OpenOrder>>,
    order_update_cb: Mutex<Option<OrderUpdateCallback>>,
    fill_cb: Mutex<Option<FillCallback>>,
    error_cb: Mutex<Option<ErrorCallback>>,
}

impl TestAdapter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            connected: AtomicBool::new(false),
            place_script: Mutex::new(VecDeque::new()),
            cancel_not_found: AtomicBool::new(false),
            open_orders: Mutex::new(Vec::new()),
            order_update_cb: Mutex::new(None),
            fill_cb: Mutex::new(None),
            error_cb: Mutex::new(None),
        }
    }

    /// Queue the outcome of the next `place_order` call. Calls beyond the
    /// queued scripts default to `Accept` with a generated id.
    pub fn push_place_script(&self, script: PlaceScript) {
        self.place_script.lock().push_back(script);
    }

    /// When set, `cancel_order`/`query_order` report "not found" for any id.
    pub fn set_not_found(&self, not_found: bool) {
        self.cancel_not_found.store(not_found, Ordering::SeqCst);
    }

    pub fn seed_open_order(&self, order: OpenOrder) {
        self.open_orders.lock().push(order);
    }

    /// Invoke the registered order-update callback, as a real adapter's
    /// callback thread would.
    pub fn emit_order_update(&self, update: OrderUpdate) {
        if let Some(cb) = self.order_update_cb.lock().as_ref() {
            cb(update);
        }
    }

    pub fn emit_fill(&self, fill: FillData) {
        if let Some(cb) = self.fill_cb.lock().as_ref() {
            cb(fill);
        }
    }
}

impl Adapter for TestAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&self, _api_key: &str, _api_secret: &str, _testnet: bool) -> bool {
        true
    }

    fn connect(&self) -> bool {
        self.connected.store(true, Ordering::SeqCst);
        true
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn place_order(&self, request: OrderRequest) -> OrderResponse {
        let script = self.place_script.lock().pop_front();
        match script {
            Some(PlaceScript::Accept { exchange_order_id }) => {
                OrderResponse::ok(exchange_order_id, "placed")
            }
            Some(PlaceScript::Reject { message }) => OrderResponse::reject(message),
            None => OrderResponse::ok(format!("{}-X", request.cl_id), "placed"),
        }
    }

    fn cancel_order(
        &self,
        cl_id: &str,
        _symbol: Option<&str>,
        _exchange_order_id: Option<&str>,
    ) -> OrderResponse {
        if self.cancel_not_found.load(Ordering::SeqCst) {
            OrderResponse::reject(format!("order {cl_id} not found"))
        } else {
            OrderResponse::ok(format!("{cl_id}-X"), "canceled")
        }
    }

    fn modify_order(
        &self,
        cl_id: &str,
        _new_size: Option<&str>,
        _new_price: Option<&str>,
    ) -> OrderResponse {
        OrderResponse::ok(format!("{cl_id}-X"), "replaced")
    }

    fn query_order(&self, cl_id: &str) -> OrderResponse {
        if self.cancel_not_found.load(Ordering::SeqCst) {
            OrderResponse::reject(format!("order {cl_id} not found"))
        } else {
            OrderResponse::ok(format!("{cl_id}-X"), "open")
        }
    }

    fn list_open_orders(
        &self,
        _category: Option<&str>,
        _symbol: Option<&str>,
        _settle: Option<&str>,
        _base_coin: Option<&str>,
    ) -> Vec<OpenOrder> {
        self.open_orders.lock().clone()
    }

    fn set_order_update_callback(&self, callback: OrderUpdateCallback) {
        *self.order_update_cb.lock() = Some(callback);
    }

    fn set_fill_callback(&self, callback: FillCallback) {
        *self.fill_cb.lock() = Some(callback);
    }

    fn set_error_callback(&self, callback: ErrorCallback) {
        *self.error_cb.lock() = Some(callback);
    }
}
