//! Fixed-capacity containers for zero-allocation hot paths
//!
//! Every structure here has a compile-time capacity and never reaches for
//! the global allocator once constructed. Exhaustion is a counted error,
//! never a panic.

pub mod flat_map;
pub mod inline_string;
pub mod pool;
pub mod queue;

pub use flat_map::FlatMap;
pub use inline_string::InlineString;
pub use pool::{Pool, PoolGuard, PoolStats};
pub use queue::SpscQueue;
