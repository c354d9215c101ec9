//! Numeric-token coercion for INE extracts.
//!
//! INE serves values in es-ES formatting: `.` groups thousands and `,` marks
//! the decimal. Census counts additionally appear with either separator used
//! purely for grouping. Tokens that do not coerce become missing and are
//! excluded from aggregation, never treated as zero.

/// True when the token parses as a number after trimming
pub fn is_numeric_token(token: &str) -> bool {
    !token.trim().is_empty() && token.trim().parse::<f64>().is_ok()
}

/// True when the byte at `offset` is an ASCII digit
pub fn probe_digit(s: &str, offset: usize) -> bool {
    s.as_bytes()
        .get(offset)
        .map(|b| b.is_ascii_digit())
        .unwrap_or(false)
}

/// Parse an es-ES decimal token: `"1.234,56"` → `1234.56`
pub fn parse_decimal_comma(token: &str) -> Option<f64> {
    let cleaned: String = token
        .trim()
        .chars()
        .filter(|c| *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a grouped integer token where both `.` and `,` only group digits:
/// `"1.234"` or `"1,234"` → `1234`
pub fn parse_grouped_int(token: &str) -> Option<f64> {
    let cleaned: String = token
        .trim()
        .chars()
        .filter(|c| *c != '.' && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<i64>().map(|n| n as f64).ok()
}
