//! Currency formatting and parsing at the display edge.
//!
//! Amounts travel through the system as integer cents. These helpers are the only
//! place cents become `$X.XX` strings, and the only place typed dollar input becomes cents.

use crate::errors::{Error, Result};

/// Largest amount one price, payment or line item may carry: $999,999,999.99.
pub const MAX_AMOUNT_CENTS: i64 = 99_999_999_999;

/// Formats cents as a dollar string with thousands separators.
///
/// `20001` becomes `"$200.01"`, `-150` becomes `"-$1.50"`.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = abs / 100;
    let remainder = abs % 100;

    let digits = dollars.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}${grouped}.{remainder:02}")
}

/// Parses typed dollar input (`"12"`, `"12.5"`, `"$1,200.05"`) into cents.
///
/// At most two fractional digits are accepted; anything else is rejected rather than rounded.
pub fn parse_dollars_to_cents(input: &str) -> Result<i64> {
    let invalid = || Error::InvalidDollarAmount {
        value: input.to_string(),
    };

    let cleaned: String = input
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let (negative, unsigned) = cleaned
        .strip_prefix('-')
        .map_or((false, cleaned.as_str()), |rest| (true, rest));

    let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if frac.len() > 2 || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole_cents = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<i64>()
            .map_err(|_| invalid())?
            .checked_mul(100)
            .ok_or_else(invalid)?
    };
    let frac_cents = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => frac.parse::<i64>().map_err(|_| invalid())?,
    };

    let cents = whole_cents.checked_add(frac_cents).ok_or_else(invalid)?;
    Ok(if negative { -cents } else { cents })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_format_cents_basic() {
        assert_eq!(format_cents(0), "$0.00");
        assert_eq!(format_cents(5), "$0.05");
        assert_eq!(format_cents(20000), "$200.00");
        assert_eq!(format_cents(20001), "$200.01");
    }

    #[test]
    fn test_format_cents_negative_and_grouped() {
        assert_eq!(format_cents(-150), "-$1.50");
        assert_eq!(format_cents(123_456_789), "$1,234,567.89");
        assert_eq!(format_cents(100_000), "$1,000.00");
        assert_eq!(format_cents(i64::MIN), "-$92,233,720,368,547,758.08");
    }

    #[test]
    fn test_parse_dollars_to_cents() {
        assert_eq!(parse_dollars_to_cents("12").unwrap(), 1200);
        assert_eq!(parse_dollars_to_cents("12.5").unwrap(), 1250);
        assert_eq!(parse_dollars_to_cents("$1,200.05").unwrap(), 120_005);
        assert_eq!(parse_dollars_to_cents(".99").unwrap(), 99);
        assert_eq!(parse_dollars_to_cents("-3.10").unwrap(), -310);
    }

    #[test]
    fn test_parse_dollars_rejects_garbage() {
        assert!(parse_dollars_to_cents("").is_err());
        assert!(parse_dollars_to_cents("abc").is_err());
        assert!(parse_dollars_to_cents("1.234").is_err());
        assert!(parse_dollars_to_cents("1.2.3").is_err());
        assert!(matches!(
            parse_dollars_to_cents("."),
            Err(Error::InvalidDollarAmount { .. })
        ));
    }
}
