//! Monitoring and observability: Prometheus metrics for the execution core,
//! and the HTTP server that exposes them (spec.md §6).

pub mod metrics;
pub mod server;

pub use metrics::ExecutionMetrics;
pub use server::serve as serve_metrics;
