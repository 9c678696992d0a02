//! Lenient number parsing for numeric constraint attributes.
//!
//! Both parsers read the longest numeric prefix after leading whitespace and
//! ignore whatever follows, so `"15kg"` reads as `15`. A string with no
//! numeric prefix yields `None`.

/// Parse the longest decimal floating-point prefix of `input`.
///
/// Accepts an optional sign, `Infinity`, digits with an optional fraction,
/// and an optional exponent. An exponent marker without digits is not part
/// of the prefix.
pub fn parse_float(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    if s[end..].starts_with("Infinity") {
        let value = f64::INFINITY;
        return Some(if bytes[0] == b'-' { -value } else { value });
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse().ok()
}

/// Parse the longest base-10 integer prefix of `input`.
///
/// The result is returned as `f64` so arbitrarily long digit runs still
/// compare sensibly.
pub fn parse_int(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = count_digits(&bytes[sign..]);

    if digits == 0 {
        return None;
    }

    s[..sign + digits].parse().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_float_plain() {
        assert_eq!(parse_float("18"), Some(18.0));
        assert_eq!(parse_float("  -2.5"), Some(-2.5));
        assert_eq!(parse_float("+.5"), Some(0.5));
        assert_eq!(parse_float("3."), Some(3.0));
        assert_eq!(parse_float("1e3"), Some(1000.0));
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float("15kg"), Some(15.0));
        assert_eq!(parse_float("2e"), Some(2.0));
        assert_eq!(parse_float("2e+"), Some(2.0));
        assert_eq!(parse_float("1.2.3"), Some(1.2));
    }

    #[test]
    fn test_parse_float_rejects() {
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("-"), None);
        assert_eq!(parse_float("e5"), None);
    }

    #[test]
    fn test_parse_float_infinity() {
        assert_eq!(parse_float("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_float("-Infinityx"), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("8"), Some(8.0));
        assert_eq!(parse_int(" 12px"), Some(12.0));
        assert_eq!(parse_int("-3"), Some(-3.0));
        assert_eq!(parse_int("4.9"), Some(4.0));
        assert_eq!(parse_int("x"), None);
        assert_eq!(parse_int("+"), None);
    }
}
