//! CLI and process-setup helpers shared by this crate's binaries.

pub mod common;
