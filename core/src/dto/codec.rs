//! JSON wire codec: bytes off the PULL socket -> `ExecutionOrder`, and
//! `ExecutionReport`/`Fill` -> bytes for the PUB socket (spec.md §4.D, §6).

use super::order::ExecutionOrder;
use super::report::{ExecutionReport, Fill};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Parse a raw ingress frame into an `ExecutionOrder`.
///
/// On failure the caller still wants the `cl_id` if it can be salvaged, so
/// callers should fall back to [`try_extract_cl_id`] before giving up and
/// publishing a `rejected`/`invalid_params` report with no `cl_id` at all
/// (per the malformed-ingress handling in spec.md §8, scenario E2E-5).
pub fn parse_order(bytes: &[u8]) -> Result<ExecutionOrder, ParseError> {
    serde_json::from_slice(bytes).map_err(ParseError::MalformedJson)
}

/// Best-effort recovery of `cl_id` from a frame that failed full
/// deserialization, so the rejection report can still echo the caller's id.
pub fn try_extract_cl_id(bytes: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    value.get("cl_id")?.as_str().map(str::to_owned)
}

pub fn write_report(report: &ExecutionReport) -> Vec<u8> {
    serde_json::to_vec(report).expect("ExecutionReport always serializes")
}

pub fn write_fill(fill: &Fill) -> Vec<u8> {
    serde_json::to_vec(fill).expect("Fill always serializes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::order::Action;

    #[test]
    fn parse_then_reject_round_trip_on_malformed_json() {
        let bytes = br#"{"cl_id": "T9", "action": "place", this is not valid json"#;
        assert!(parse_order(bytes).is_err());
        assert_eq!(try_extract_cl_id(bytes), None);
    }

    #[test]
    fn salvages_cl_id_from_otherwise_invalid_order() {
        let bytes = br#"{"cl_id": "T9", "action": "bogus_action"}"#;
        assert!(parse_order(bytes).is_err());
        assert_eq!(try_extract_cl_id(bytes).as_deref(), Some("T9"));
    }

    #[test]
    fn valid_order_round_trips_through_parse() {
        let bytes = br#"{"version":1,"cl_id":"T1","action":"place","venue":"hyperliquid",
            "product_type":"perpetual","details":{"symbol":"BTC-USDT-PERP","side":"buy",
            "order_type":"limit","price":"50000","size":"0.01"}}"#;
        let order = parse_order(bytes).unwrap();
        assert_eq!(order.action, Action::Place);
        assert_eq!(order.cl_id, "T1");
    }
}
