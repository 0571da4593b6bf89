//! Symbol canonicalization between compact (`BTCUSDT`) and hyphen
//! (`BTC-USDT`, `BTC-USDT-PERP`) forms.
//!
//! Accepts input in compact, hyphen, lowercase, or slash-separated form,
//! with or without a `PERP`/`-PERP` suffix. Outbound reports always use the
//! hyphen form (spec.md invariant 5); adapters pick whichever form their
//! venue wants on the way out.

/// Known quote currencies, longest-first so `USDT` matches before `USD`.
const QUOTE_CURRENCIES: &[&str] = &["USDT", "USDC", "USD", "BTC", "ETH"];

fn strip_perp_suffix(input: &str) -> (String, bool) {
    let upper = input.trim().to_uppercase();
    if let Some(stripped) = upper.strip_suffix("-PERP") {
        (stripped.to_string(), true)
    } else if let Some(stripped) = upper.strip_suffix("PERP") {
        (stripped.to_string(), true)
    } else {
        (upper, false)
    }
}

fn split_base_quote(s: &str) -> Option<(String, String)> {
    if let Some(idx) = s.find(['-', '/']) {
        let base = &s[..idx];
        let quote = &s[idx + 1..];
        if base.is_empty() || quote.is_empty() {
            return None;
        }
        return Some((base.to_string(), quote.to_string()));
    }

    let mut quotes: Vec<&&str> = QUOTE_CURRENCIES.iter().collect();
    quotes.sort_by_key(|q| std::cmp::Reverse(q.len()));
    for quote in quotes {
        if s.len() > quote.len() && s.ends_with(quote) {
            let base = &s[..s.len() - quote.len()];
            return Some((base.to_string(), quote.to_string()));
        }
    }
    None
}

/// Parse any recognized symbol form and render it as hyphenated:
/// `BTC-USDT` or, for perpetuals, `BTC-USDT-PERP`.
///
/// `perpetual_hint` forces the `-PERP` suffix even if the input didn't
/// carry one (callers pass `product_type == "perpetual"` here).
pub fn to_hyphen(input: &str, perpetual_hint: bool) -> Option<String> {
    let (stripped, had_perp_suffix) = strip_perp_suffix(input);
    let (base, quote) = split_base_quote(&stripped)?;
    let is_perp = perpetual_hint || had_perp_suffix;
    Some(if is_perp {
        format!("{base}-{quote}-PERP")
    } else {
        format!("{base}-{quote}")
    })
}

/// Render as compact form (`BTCUSDT`), dropping any perp suffix — this is
/// the form most adapters (other than the hyphenated reference DEX) expect
/// on the wire.
pub fn to_compact(input: &str) -> Option<String> {
    let (stripped, _) = strip_perp_suffix(input);
    let (base, quote) = split_base_quote(&stripped)?;
    Some(format!("{base}{quote}"))
}
