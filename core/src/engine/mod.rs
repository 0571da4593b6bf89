//! The execution core: ingress receiver, order-tracker-backed dispatch,
//! adapter callback handling, egress publisher, and periodic stats
//! (spec.md §4.H).

pub mod callbacks;
pub mod execution_core;
pub mod publish_queue;
pub mod publisher;
pub mod receiver;
pub mod shared;
pub mod stats;

pub use execution_core::ExecutionEngine;
pub use publish_queue::{PublishMessage, PublishQueue, Topic};
pub use shared::{EngineShared, LatencyAccumulator};
