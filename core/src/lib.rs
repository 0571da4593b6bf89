//! latentspeed-core - the execution core of a high-frequency trading
//! service: accepts normalized execution orders over a ZMQ PULL socket,
//! routes them to venue adapters, tracks order lifecycle across
//! asynchronous venue callbacks, and publishes canonical execution reports
//! and fills over a ZMQ PUB socket.
//!
//! ## Modules
//! - `containers`: fixed-capacity, zero-allocation building blocks (inline
//!   string, object pool, SPSC ring, flat map).
//! - `timing`: monotonic nanosecond clock, CPU affinity, RT scheduling.
//! - `normalize`: venue-agnostic symbol/status/reason canonicalization.
//! - `dto`: typed `ExecutionOrder`/`ExecutionReport`/`Fill` and their JSON
//!   codec.
//! - `adapter`: the venue adapter contract, router, and the hyperliquid
//!   reference adapter.
//! - `tracker`: the Pending/Processed order tracker.
//! - `engine`: the receiver/publisher/stats threads and callback dispatch
//!   tying everything together.
//! - `resilience`: backoff and circuit-breaker primitives used by adapters.
//! - `config`: runtime configuration resolved from environment variables.
//! - `monitoring`: Prometheus metrics.
//! - `testing`: a scriptable `Adapter` test double.

pub mod adapter;
pub mod config;
pub mod containers;
pub mod dto;
pub mod engine;
pub mod monitoring;
pub mod normalize;
pub mod resilience;
pub mod testing;
pub mod timing;
pub mod tracker;

pub use adapter::{Adapter, VenueRouter};
pub use config::RuntimeConfig;
pub use dto::{ExecutionOrder, ExecutionReport, Fill};
pub use engine::ExecutionEngine;

pub use anyhow::{Error, Result};

/// Convenience re-exports for binaries built against this crate.
pub mod prelude {
    pub use crate::adapter::{Adapter, OrderRequest, OrderResponse, VenueRouter};
    pub use crate::config::RuntimeConfig;
    pub use crate::dto::{ExecutionOrder, ExecutionReport, Fill};
    pub use crate::engine::ExecutionEngine;
    pub use crate::{Error, Result};
}
