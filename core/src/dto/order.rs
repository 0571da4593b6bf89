//! `ExecutionOrder` — the inbound request DTO (spec.md §3, §6).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

fn deserialize_decimal_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => {
            Decimal::from_str(s.trim()).map(Some).map_err(serde::de::Error::custom)
        }
        Some(serde_json::Value::Number(n)) => Decimal::from_str(&n.to_string())
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(_) => Err(serde::de::Error::custom("expected a decimal number or string")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Place,
    Cancel,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Spot,
    Perpetual,
    Future,
    Option,
}

impl ProductType {
    pub fn is_perpetual(&self) -> bool {
        matches!(self, ProductType::Perpetual)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CancelDetails {
    pub cancel_cl_id_to_cancel: Option<String>,
    pub symbol: Option<String>,
    pub exchange_order_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReplaceDetails {
    pub replace_cl_id_to_replace: Option<String>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub new_price: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub new_size: Option<Decimal>,
}

/// The `details` object. Which fields are populated depends on `action`;
/// the parser tolerates all of them being absent (e.g. a bare cancel only
/// needs `cancel`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrderDetails {
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub order_type: Option<String>,
    pub time_in_force: Option<String>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub size: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub stop_price: Option<Decimal>,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub cancel: CancelDetails,
    #[serde(default)]
    pub replace: ReplaceDetails,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutionOrder {
    pub version: u32,
    pub cl_id: String,
    pub action: Action,
    #[serde(default)]
    pub venue_type: Option<String>,
    pub venue: String,
    pub product_type: ProductType,
    #[serde(default)]
    pub ts_ns: u64,
    #[serde(default)]
    pub details: OrderDetails,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl ExecutionOrder {
    /// Lowercased venue key, as spec.md §3 requires for routing.
    pub fn venue_key(&self) -> String {
        self.venue.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_and_string_decimals() {
        let json = r#"{"version":1,"cl_id":"T1","action":"place","venue":"hyperliquid",
            "product_type":"perpetual","details":{"price":50000.0,"size":"0.01"}}"#;
        let order: ExecutionOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.details.price, Some(Decimal::from_str("50000.0").unwrap()));
        assert_eq!(order.details.size, Some(Decimal::from_str("0.01").unwrap()));
    }

    #[test]
    fn tolerates_missing_optional_fields_and_empty_tags() {
        let json = r#"{"version":1,"cl_id":"T2","action":"cancel","venue":"hyperliquid",
            "product_type":"spot","details":{"cancel":{"cancel_cl_id_to_cancel":"T1"}}}"#;
        let order: ExecutionOrder = serde_json::from_str(json).unwrap();
        assert!(order.tags.is_empty());
        assert_eq!(order.details.cancel.cancel_cl_id_to_cancel.as_deref(), Some("T1"));
    }

    #[test]
    fn unknown_extra_fields_are_ignored() {
        let json = r#"{"version":1,"cl_id":"T3","action":"place","venue":"hyperliquid",
            "product_type":"spot","unexpected_field":123,"details":{"unexpected":"x"}}"#;
        let order: ExecutionOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.cl_id, "T3");
    }
}
