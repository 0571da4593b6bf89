//! Outbound `ExecutionReport` / `Fill` DTOs (spec.md §4.D, §6).
//!
//! Field declaration order here is load-bearing: serde_json preserves
//! struct field order on serialization, and the wire examples in spec.md
//! §6 fix that order exactly.

use crate::normalize::CanonicalStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liquidity {
    Maker,
    Taker,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub version: u32,
    pub cl_id: String,
    pub status: CanonicalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_order_id: Option<String>,
    pub reason_code: String,
    pub reason_text: String,
    pub ts_ns: u64,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub version: u32,
    pub cl_id: String,
    pub exchange_order_id: String,
    pub exec_id: String,
    pub symbol_or_pair: String,
    pub price: Decimal,
    pub size: Decimal,
    pub fee_currency: String,
    pub fee_amount: Decimal,
    pub liquidity: Liquidity,
    pub ts_ns: u64,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}
