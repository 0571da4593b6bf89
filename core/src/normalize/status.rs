//! Raw venue status strings → the canonical status vocabulary.

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStatus {
    Accepted,
    Canceled,
    Rejected,
    Replaced,
    Open,
    PartiallyFilled,
    Filled,
    Expired,
}

impl CanonicalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStatus::Accepted => "accepted",
            CanonicalStatus::Canceled => "canceled",
            CanonicalStatus::Rejected => "rejected",
            CanonicalStatus::Replaced => "replaced",
            CanonicalStatus::Open => "open",
            CanonicalStatus::PartiallyFilled => "partially_filled",
            CanonicalStatus::Filled => "filled",
            CanonicalStatus::Expired => "expired",
        }
    }

    /// Terminal set per spec.md §4.C: reaching one of these removes the
    /// order from the Pending map.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CanonicalStatus::Filled
                | CanonicalStatus::Canceled
                | CanonicalStatus::Rejected
                | CanonicalStatus::Expired
        )
    }
}

type StatusRule = (&'static str, CanonicalStatus);

const GENERIC_TABLE: &[StatusRule] = &[
    ("accepted", CanonicalStatus::Accepted),
    ("canceled", CanonicalStatus::Canceled),
    ("cancelled", CanonicalStatus::Canceled),
    ("rejected", CanonicalStatus::Rejected),
    ("replaced", CanonicalStatus::Replaced),
    ("open", CanonicalStatus::Open),
    ("new", CanonicalStatus::Open),
    ("partially_filled", CanonicalStatus::PartiallyFilled),
    ("partiallyfilled", CanonicalStatus::PartiallyFilled),
    ("filled", CanonicalStatus::Filled),
    ("expired", CanonicalStatus::Expired),
];

/// Hyperliquid-specific raw order statuses, per spec.md §4.I.
const HYPERLIQUID_TABLE: &[StatusRule] = &[
    ("open", CanonicalStatus::Open),
    ("filled", CanonicalStatus::Filled),
    ("canceled", CanonicalStatus::Canceled),
    ("cancelled", CanonicalStatus::Canceled),
    ("rejected", CanonicalStatus::Rejected),
    ("tickrejected", CanonicalStatus::Rejected),
    ("badaloprejected", CanonicalStatus::Rejected),
    ("badalopxrejected", CanonicalStatus::Rejected),
    ("mintradentlrejected", CanonicalStatus::Rejected),
    ("expired", CanonicalStatus::Expired),
];

fn table_for(venue: &str) -> &'static [StatusRule] {
    match venue {
        "hyperliquid" => HYPERLIQUID_TABLE,
        _ => GENERIC_TABLE,
    }
}

/// Map a raw venue status string to the canonical vocabulary. Unknown raw
/// strings map to `Rejected` (the tracker is expected to attach
/// `reason_code = venue_reject` and log the raw value).
pub fn map_status(venue: &str, raw: &str) -> CanonicalStatus {
    let lower = raw.to_lowercase();
    for (pattern, status) in table_for(venue) {
        if *pattern == lower {
            return *status;
        }
    }
    tracing::warn!(venue, raw, "unrecognized venue status, defaulting to rejected");
    CanonicalStatus::Rejected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_map() {
        assert_eq!(map_status("hyperliquid", "filled"), CanonicalStatus::Filled);
        assert_eq!(
            map_status("hyperliquid", "tickRejected"),
            CanonicalStatus::Rejected
        );
    }

    #[test]
    fn unknown_status_maps_to_rejected() {
        assert_eq!(map_status("hyperliquid", "somethingNew"), CanonicalStatus::Rejected);
    }

    #[test]
    fn terminal_set_matches_spec() {
        assert!(CanonicalStatus::Filled.is_terminal());
        assert!(CanonicalStatus::Canceled.is_terminal());
        assert!(CanonicalStatus::Rejected.is_terminal());
        assert!(CanonicalStatus::Expired.is_terminal());
        assert!(!CanonicalStatus::Open.is_terminal());
        assert!(!CanonicalStatus::PartiallyFilled.is_terminal());
        assert!(!CanonicalStatus::Accepted.is_terminal());
        assert!(!CanonicalStatus::Replaced.is_terminal());
    }
}
