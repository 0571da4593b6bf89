//! The venue adapter contract, router, and the reference perpetual-futures
//! DEX adapter (spec.md §4.E, §4.F, §4.I).

pub mod contract;
pub mod hyperliquid;
pub mod router;

pub use contract::{
    Adapter, ErrorCallback, FillCallback, FillData, OpenOrder, OrderRequest, OrderResponse,
    OrderUpdate, OrderUpdateCallback,
};
pub use router::VenueRouter;
