//! A programmable test double for [`crate::adapter::Adapter`], used by the
//! engine's own integration tests to drive the end-to-end scenarios in
//! spec.md §8 without a real venue connection.

mod test_adapter;

pub use test_adapter::{PlaceScript, TestAdapter};
