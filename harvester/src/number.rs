//! Parsing of the abbreviated counts the watch page renders ("1.2K views", "3M subscribers").

use regex::Regex;
use std::sync::LazyLock;

static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9,.]+)\s*([kmb])?").expect("count pattern is a valid regex")
});

/// Extracts the first count found in `text`.
///
/// Thousands separators are ignored and an optional `K`/`M`/`B` suffix (any case) scales the
/// value. Fractional results are truncated, so `"1.25K"` is 1250 and `"1.5"` is 1.
///
/// Returns `None` when `text` holds no parseable number at all. `"0 views"` is `Some(0)`.
pub fn parse_count(text: &str) -> Option<u64> {
    let caps = COUNT_RE.captures(text)?;
    let digits = caps.get(1)?.as_str().replace(',', "");
    let multiplier: u128 = match caps.get(2).map(|m| m.as_str()) {
        Some("k" | "K") => 1_000,
        Some("m" | "M") => 1_000_000,
        Some("b" | "B") => 1_000_000_000,
        _ => 1,
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits.as_str(), ""),
    };
    if fraction.contains('.') || (whole.is_empty() && fraction.is_empty()) {
        return None;
    }

    // Work in exact decimal arithmetic so "1.15K" is 1150 rather than a float artifact below it.
    let mut mantissa: u128 = 0;
    for ch in whole.chars().chain(fraction.chars()) {
        let digit = u128::from(ch.to_digit(10)?);
        mantissa = mantissa.checked_mul(10)?.checked_add(digit)?;
    }
    let scale = 10u128.checked_pow(u32::try_from(fraction.len()).ok()?)?;
    let value = mantissa.checked_mul(multiplier)? / scale;
    u64::try_from(value).ok()
}
