//! Resilience patterns used by venue adapters: retry backoff and a circuit
//! breaker around the reference adapter's signed REST calls (spec.md §4.I).

pub mod backoff;
pub mod circuit_breaker;

pub use backoff::{BackoffConfig, ExponentialBackoff};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
