//! Property-based tests for symbol canonicalization.
//!
//! Unit tests in `symbol.rs` pin specific forms; these sweep random
//! base/quote/perp combinations to check the round-trip and idempotence
//! laws hold generally, not just for the hand-picked examples.

#[cfg(test)]
mod tests {
    use super::super::symbol::{to_compact, to_hyphen};
    use proptest::prelude::*;

    fn base_strategy() -> impl Strategy<Value = String> {
        "[A-Z]{2,6}".prop_filter("base must not itself end in a quote currency", |s| {
            !["USDT", "USDC", "USD", "BTC", "ETH"]
                .iter()
                .any(|q| s.ends_with(*q))
        })
    }

    fn quote_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("USDT"),
            Just("USDC"),
            Just("USD"),
            Just("BTC"),
            Just("ETH"),
        ]
    }

    proptest! {
        /// Hyphenating a symbol, then re-hyphenating the hyphenated form,
        /// always converges to the same string (idempotence).
        #[test]
        fn to_hyphen_is_idempotent(base in base_strategy(), quote in quote_strategy(), perp in any::<bool>()) {
            let input = format!("{base}{quote}");
            let once = to_hyphen(&input, perp).unwrap();
            let twice = to_hyphen(&once, perp).unwrap();
            prop_assert_eq!(once, twice);
        }

        /// Round-tripping compact form through `to_hyphen` reproduces what
        /// hyphenating the original directly would have produced.
        #[test]
        fn compact_then_hyphen_matches_direct_hyphen(base in base_strategy(), quote in quote_strategy(), perp in any::<bool>()) {
            let input = format!("{base}-{quote}");
            let direct = to_hyphen(&input, perp).unwrap();
            let compact = to_compact(&input).unwrap();
            let via_compact = to_hyphen(&compact, perp).unwrap();
            prop_assert_eq!(direct, via_compact);
        }

        /// `to_compact` always drops hyphens and any perp suffix, regardless
        /// of which recognized form it was given.
        #[test]
        fn to_compact_never_contains_a_hyphen(base in base_strategy(), quote in quote_strategy()) {
            let input = format!("{base}-{quote}-PERP");
            let compact = to_compact(&input).unwrap();
            prop_assert!(!compact.contains('-'));
            prop_assert_eq!(compact, format!("{base}{quote}"));
        }
    }
}
