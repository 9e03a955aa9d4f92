//! Input-boundary coercion for form-style values.

/// Parse a count the way the configuration form does: optional leading
/// whitespace and sign, then leading digits; anything else is 0.
///
/// Negative results are clamped to 0 so they never reach the store.
pub fn coerce_count(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: &str = &rest[..rest.bytes().take_while(u8::is_ascii_digit).count()];
    if digits.is_empty() || negative {
        return 0;
    }
    digits
        .bytes()
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')))
}
