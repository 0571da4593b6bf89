//! Raw venue error text → the canonical `reason_code` vocabulary
//! (spec.md §4.C / §7).

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    Ok,
    InvalidParams,
    RiskBlocked,
    VenueReject,
    InsufficientBalance,
    PostOnlyViolation,
    MinSize,
    PriceOutOfBounds,
    RateLimited,
    NetworkError,
    Expired,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Ok => "ok",
            ReasonCode::InvalidParams => "invalid_params",
            ReasonCode::RiskBlocked => "risk_blocked",
            ReasonCode::VenueReject => "venue_reject",
            ReasonCode::InsufficientBalance => "insufficient_balance",
            ReasonCode::PostOnlyViolation => "post_only_violation",
            ReasonCode::MinSize => "min_size",
            ReasonCode::PriceOutOfBounds => "price_out_of_bounds",
            ReasonCode::RateLimited => "rate_limited",
            ReasonCode::NetworkError => "network_error",
            ReasonCode::Expired => "expired",
        }
    }
}

/// A single reason-mapping rule: case-insensitive substring match against
/// raw venue text. Rules are evaluated in order; the first match wins.
pub struct ReasonRule {
    pub pattern: &'static str,
    pub code: ReasonCode,
}

const fn rule(pattern: &'static str, code: ReasonCode) -> ReasonRule {
    ReasonRule { pattern, code }
}

/// Hyperliquid-specific vocabulary, checked before the generic fallback
/// table. Ordered most-specific first.
const HYPERLIQUID_RULES: &[ReasonRule] = &[
    rule("mintradentl", ReasonCode::MinSize),
    rule("min_notional", ReasonCode::MinSize),
    rule("badalopx", ReasonCode::PostOnlyViolation),
    rule("badalo", ReasonCode::PostOnlyViolation),
    rule("tickrejected", ReasonCode::PriceOutOfBounds),
    rule("tick", ReasonCode::PriceOutOfBounds),
    rule("insufficient margin", ReasonCode::InsufficientBalance),
    rule("insufficient balance", ReasonCode::InsufficientBalance),
    rule("insufficient", ReasonCode::InsufficientBalance),
    rule("rate limit", ReasonCode::RateLimited),
    rule("expired", ReasonCode::Expired),
];

/// Generic rules applied to any venue (and as a fallback after
/// venue-specific rules fail to match).
const GENERIC_RULES: &[ReasonRule] = &[
    rule("insufficient", ReasonCode::InsufficientBalance),
    rule("post only", ReasonCode::PostOnlyViolation),
    rule("post-only", ReasonCode::PostOnlyViolation),
    rule("min size", ReasonCode::MinSize),
    rule("minimum size", ReasonCode::MinSize),
    rule("price out of", ReasonCode::PriceOutOfBounds),
    rule("rate limit", ReasonCode::RateLimited),
    rule("timeout", ReasonCode::NetworkError),
    rule("network", ReasonCode::NetworkError),
    rule("connection", ReasonCode::NetworkError),
    rule("expired", ReasonCode::Expired),
    rule("invalid", ReasonCode::InvalidParams),
];

fn rules_for(venue: &str) -> &'static [ReasonRule] {
    match venue {
        "hyperliquid" => HYPERLIQUID_RULES,
        _ => &[],
    }
}

/// Map raw venue error text to a canonical reason code. Anything unmatched
/// defaults to `venue_reject`; the raw text itself is preserved by the
/// caller in `reason_text`, never discarded.
pub fn map_reason(venue: &str, raw: &str) -> ReasonCode {
    let lower = raw.to_lowercase();
    for r in rules_for(venue).iter().chain(GENERIC_RULES.iter()) {
        if lower.contains(r.pattern) {
            return r.code;
        }
    }
    ReasonCode::VenueReject
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyperliquid_specific_rules_take_priority() {
        assert_eq!(
            map_reason("hyperliquid", "Order badAloPxRejected: would cross"),
            ReasonCode::PostOnlyViolation
        );
        assert_eq!(
            map_reason("hyperliquid", "minTradeNtlRejected"),
            ReasonCode::MinSize
        );
    }

    #[test]
    fn unmatched_text_defaults_to_venue_reject() {
        assert_eq!(map_reason("hyperliquid", "unspecified failure"), ReasonCode::VenueReject);
    }

    #[test]
    fn generic_rules_apply_to_unknown_venues() {
        assert_eq!(
            map_reason("bybit", "Insufficient balance for order"),
            ReasonCode::InsufficientBalance
        );
    }

    #[test]
    fn is_case_insensitive() {
        assert_eq!(
            map_reason("bybit", "RATE LIMIT EXCEEDED"),
            ReasonCode::RateLimited
        );
    }
}
