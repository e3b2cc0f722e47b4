//! Market value strings ("10M €", "500K €") to plain numbers.

const MILLION: f64 = 1_000_000.0;
const THOUSAND: f64 = 1_000.0;

/// Parses a display value into a number.
///
/// Everything except digits, `.` and `,` is dropped and the longest leading
/// decimal literal of what remains is read. An `M` anywhere in the input
/// multiplies by a million, otherwise a `K` multiplies by a thousand.
///
/// Absent or empty input is `0.0`. Input with no readable number is `NaN`;
/// callers comparing against ranges must treat that as a non-match.
pub fn parse_value(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    if raw.is_empty() {
        return 0.0;
    }

    let kept: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == ',')
        .collect();
    let num = leading_decimal(&kept);

    if raw.contains('M') {
        num * MILLION
    } else if raw.contains('K') {
        num * THOUSAND
    } else {
        num
    }
}

/// Converts a bound entered in millions ("12", "0.5") the same way a player
/// value with an `M` suffix would be read.
pub fn parse_million_bound(bound: f64) -> f64 {
    parse_value(Some(&format!("{bound}M")))
}

fn leading_decimal(raw: &str) -> f64 {
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (idx, ch) in raw.char_indices() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = idx + ch.len_utf8();
    }
    if !seen_digit {
        return f64::NAN;
    }
    raw[..end].trim_end_matches('.').parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_millions_and_thousands() {
        assert_eq!(parse_value(Some("10M €")), 10_000_000.0);
        assert_eq!(parse_value(Some("500K")), 500_000.0);
        assert_eq!(parse_value(Some("1.5M €")), 1_500_000.0);
        assert_eq!(parse_value(Some("€750")), 750.0);
    }

    #[test]
    fn empty_and_absent_are_zero() {
        assert_eq!(parse_value(Some("")), 0.0);
        assert_eq!(parse_value(None), 0.0);
    }

    #[test]
    fn unreadable_number_is_nan() {
        assert!(parse_value(Some("M €")).is_nan());
        assert!(parse_value(Some("-")).is_nan());
    }

    #[test]
    fn comma_stops_the_literal() {
        assert_eq!(parse_value(Some("1,5M")), 1_000_000.0);
        assert_eq!(parse_value(Some("10.5.3")), 10.5);
    }

    #[test]
    fn million_bound_matches_suffixed_value() {
        assert_eq!(parse_million_bound(12.0), 12_000_000.0);
        assert_eq!(parse_million_bound(0.5), 500_000.0);
    }
}
