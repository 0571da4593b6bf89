//! Venue-agnostic canonicalization: symbols, order statuses, and error
//! reason codes. Table-driven so adding a venue never requires editing
//! core dispatch code.

pub mod reason;
pub mod status;
pub mod symbol;
#[cfg(test)]
mod symbol_proptest;

pub use reason::{map_reason, ReasonCode, ReasonRule};
pub use status::{map_status, CanonicalStatus};
pub use symbol::{to_compact, to_hyphen};
