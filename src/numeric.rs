//! Numeric Normalizer
//!
//! Measurements are typed free-form ("18 in", "12\"", "~6"). Everything except
//! digits, `.` and `-` is discarded, then the longest leading decimal number is
//! taken. Anything without a finite number is simply not comparable.

/// Parse free-form measurement text into a comparable value.
///
/// Returns `None` when no finite number can be recovered. This is a normal
/// outcome, not an error.
pub fn normalize(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let prefix = leading_number(&cleaned)?;
    prefix.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Longest prefix of the form `-?digits[.digits]` (or `-?.digits`).
/// Trailing junk such as a second `.` or an inner `-` ends the number.
fn leading_number(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut end = 0;

    if bytes.first() == Some(&b'-') {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - frac_start;
        if frac_digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }

    if digits == 0 {
        return None;
    }
    Some(&s[..end])
}

/// Render a computed required value the way a user would type it:
/// `18` rather than `18.0`, `4.5` stays `4.5`.
pub fn format_value(value: f64) -> String {
    if value == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(normalize("18"), Some(18.0));
        assert_eq!(normalize("  6.5 "), Some(6.5));
        assert_eq!(normalize("-3"), Some(-3.0));
        assert_eq!(normalize(".5"), Some(0.5));
        assert_eq!(normalize("5."), Some(5.0));
    }

    #[test]
    fn test_units_and_noise_are_stripped() {
        assert_eq!(normalize("18 in"), Some(18.0));
        assert_eq!(normalize("12\""), Some(12.0));
        assert_eq!(normalize("approx. 36 inches"), Some(0.36));
        assert_eq!(normalize("1e5"), Some(15.0));
    }

    #[test]
    fn test_trailing_junk_ends_the_number() {
        assert_eq!(normalize("12.5.3"), Some(12.5));
        assert_eq!(normalize("1-2"), Some(1.0));
    }

    #[test]
    fn test_not_comparable() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize("abc"), None);
        assert_eq!(normalize("-"), None);
        assert_eq!(normalize("."), None);
        assert_eq!(normalize("--5"), None);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(18.0), "18");
        assert_eq!(format_value(9.0), "9");
        assert_eq!(format_value(4.5), "4.5");
        assert_eq!(format_value(-0.0), "0");
    }
}
