//! Order-type to wire-payload mapping (spec.md §4.I).
//!
//! The venue's `order` action takes an `orderType` object keyed by `limit`
//! or `trigger`; which one, and with what flags, depends on our normalized
//! `order_type`/`time_in_force`.

use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingError {
    UnknownOrderType,
    MissingPrice,
}

impl std::fmt::Display for MappingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingError::UnknownOrderType => write!(f, "unrecognized order_type"),
            MappingError::MissingPrice => write!(f, "order_type requires a price"),
        }
    }
}

/// Builds the `orderType` wire object for a normalized `order_type`.
/// `market` orders are sent as an aggressive IOC limit at the caller's
/// supplied price — the venue has no separate market order type.
pub fn order_type_payload(order_type: &str) -> Result<Value, MappingError> {
    match order_type.to_lowercase().as_str() {
        "limit" => Ok(json!({"limit": {"tif": "Gtc"}})),
        "post_only" => Ok(json!({"limit": {"tif": "Alo"}})),
        "market" => Ok(json!({"limit": {"tif": "Ioc"}})),
        "stop" => Ok(json!({"trigger": {"isMarket": true, "tpsl": "sl"}})),
        "stop_limit" => Ok(json!({"trigger": {"isMarket": false, "tpsl": "sl"}})),
        _ => Err(MappingError::UnknownOrderType),
    }
}

/// Formats a decimal string the way the venue's Python SDK does:
/// round to 8 places, then strip trailing zeros (and a trailing dot).
/// Callers typically already hand in a `Decimal::normalize().to_string()`,
/// but venue-bound values sometimes need re-trimming after arithmetic
/// (e.g. the aggressive-price bump for IOC market orders).
pub fn trim_decimal_string(raw: &str) -> String {
    if !raw.contains('.') {
        return raw.to_string();
    }
    let trimmed = raw.trim_end_matches('0');
    trimmed.trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_maps_to_gtc() {
        assert_eq!(order_type_payload("limit").unwrap(), json!({"limit": {"tif": "Gtc"}}));
    }

    #[test]
    fn post_only_maps_to_alo() {
        assert_eq!(order_type_payload("post_only").unwrap(), json!({"limit": {"tif": "Alo"}}));
    }

    #[test]
    fn market_maps_to_ioc() {
        assert_eq!(order_type_payload("market").unwrap(), json!({"limit": {"tif": "Ioc"}}));
    }

    #[test]
    fn stop_is_market_trigger() {
        let payload = order_type_payload("stop").unwrap();
        assert_eq!(payload["trigger"]["isMarket"], true);
    }

    #[test]
    fn stop_limit_is_limit_trigger() {
        let payload = order_type_payload("stop_limit").unwrap();
        assert_eq!(payload["trigger"]["isMarket"], false);
    }

    #[test]
    fn unknown_order_type_is_rejected() {
        assert_eq!(order_type_payload("iceberg"), Err(MappingError::UnknownOrderType));
    }

    #[test]
    fn trims_trailing_zeros_and_dot() {
        assert_eq!(trim_decimal_string("50000.00000000"), "50000");
        assert_eq!(trim_decimal_string("0.01000000"), "0.01");
        assert_eq!(trim_decimal_string("100"), "100");
    }
}
