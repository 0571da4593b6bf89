//! Typed representation of inbound orders and outbound reports/fills, plus
//! the JSON codec between them and the wire.

pub mod codec;
pub mod order;
pub mod report;

pub use codec::{parse_order, try_extract_cl_id, write_fill, write_report, ParseError};
pub use order::{Action, CancelDetails, ExecutionOrder, OrderDetails, ProductType, ReplaceDetails};
pub use report::{ExecutionReport, Fill, Liquidity};

/// The caller-chosen primary key for an order, stable across ingress,
/// venue, and egress. Bounded at 64 bytes per spec.md §3.
pub type ClientOrderId = crate::containers::InlineString<64>;
