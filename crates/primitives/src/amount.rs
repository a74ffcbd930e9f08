use alloy_primitives::U256;
use thiserror::Error;

/// Errors produced while converting between decimal strings and smallest units.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    /// The input contained no digits.
    #[error("empty amount")]
    Empty,
    /// The input is not a plain non-negative decimal number.
    #[error("invalid decimal amount {0:?}")]
    Invalid(String),
    /// The scaled amount does not fit in 256 bits.
    #[error("amount {0:?} overflows 256 bits")]
    Overflow(String),
    /// Summing amounts overflowed 256 bits.
    #[error("amount sum overflows 256 bits")]
    SumOverflow,
}

/// Result of parsing a decimal string into smallest units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedAmount {
    /// Amount in smallest units.
    pub value: U256,
    /// Whether fractional digits beyond the supported precision were dropped.
    pub truncated: bool,
}

/// Returns `10^exp`, or `None` if it does not fit in 256 bits.
pub fn pow10(exp: u32) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(exp))
}

/// Parses a human decimal string (`"12.5"`) into an integer of smallest units.
///
/// The conversion is exact: the fractional part is right-padded with zeros to
/// `decimals` digits. Digits beyond `decimals` are truncated and reported through
/// [`ParsedAmount::truncated`].
pub fn parse_decimal(input: &str, decimals: u32) -> Result<ParsedAmount, AmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, fraction) = input.split_once('.').unwrap_or((input, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(whole) || !is_digits(fraction) || (whole.is_empty() && fraction.is_empty()) {
        return Err(AmountError::Invalid(input.to_string()));
    }

    let precision = decimals as usize;
    let truncated = fraction.len() > precision && fraction[precision..].bytes().any(|b| b != b'0');
    let kept = &fraction[..fraction.len().min(precision)];

    let mut digits = String::with_capacity(whole.len() + precision);
    digits.push_str(whole);
    digits.push_str(kept);
    digits.extend(std::iter::repeat('0').take(precision - kept.len()));

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(ParsedAmount { value: U256::ZERO, truncated });
    }

    let value = U256::from_str_radix(digits, 10)
        .map_err(|_| AmountError::Overflow(input.to_string()))?;
    Ok(ParsedAmount { value, truncated })
}

/// Renders `amount` smallest units as a decimal string with `decimals` places.
///
/// Trailing fractional zeros are trimmed and whole numbers carry no separator.
pub fn format_decimal(amount: U256, decimals: u32) -> String {
    let digits = amount.to_string();
    let precision = decimals as usize;
    if precision == 0 {
        return digits;
    }

    let padded = if digits.len() <= precision {
        format!("{}{digits}", "0".repeat(precision + 1 - digits.len()))
    } else {
        digits
    };

    let (whole, fraction) = padded.split_at(padded.len() - precision);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!(parse_decimal("12.5", 10).unwrap().value, U256::from(125_000_000_000u64));
        assert_eq!(parse_decimal("5", 10).unwrap().value, U256::from(50_000_000_000u64));
        assert_eq!(parse_decimal("0.0000000001", 10).unwrap().value, U256::from(1u64));
        assert_eq!(parse_decimal(" 7. ", 10).unwrap().value, U256::from(70_000_000_000u64));
        assert_eq!(parse_decimal(".25", 10).unwrap().value, U256::from(2_500_000_000u64));
        assert_eq!(parse_decimal("0", 10).unwrap().value, U256::ZERO);
    }

    #[test]
    fn parses_values_floats_cannot_represent() {
        let parsed = parse_decimal("123456789.0123456789", 10).unwrap();
        assert_eq!(parsed.value, U256::from(1_234_567_890_123_456_789u64));
        assert!(!parsed.truncated);
    }

    #[test]
    fn truncates_excess_precision() {
        let parsed = parse_decimal("1.00000000019", 10).unwrap();
        assert_eq!(parsed.value, U256::from(10_000_000_001u64));
        assert!(parsed.truncated);

        let zeros = parse_decimal("1.000000000000", 10).unwrap();
        assert_eq!(zeros.value, U256::from(10_000_000_000u64));
        assert!(!zeros.truncated);
    }

    #[test]
    fn rejects_non_decimal_input() {
        for bad in ["abc", "1.2.3", "-1", "+1", "1e5", ".", "1,5", "0x10"] {
            assert!(
                matches!(parse_decimal(bad, 10), Err(AmountError::Invalid(_))),
                "{bad} should be rejected"
            );
        }
        assert_eq!(parse_decimal("   ", 10), Err(AmountError::Empty));
    }

    #[test]
    fn rejects_amounts_beyond_256_bits() {
        let huge = "9".repeat(80);
        assert!(matches!(parse_decimal(&huge, 10), Err(AmountError::Overflow(_))));
    }

    #[test]
    fn renders_trimmed_decimal_strings() {
        assert_eq!(format_decimal(U256::from(12_345_000_000u64), 10), "1.2345");
        assert_eq!(format_decimal(U256::from(50_000_000_000u64), 10), "5");
        assert_eq!(format_decimal(U256::from(5u64), 10), "0.0000000005");
        assert_eq!(format_decimal(U256::ZERO, 10), "0");
        assert_eq!(format_decimal(U256::from(1234u64), 0), "1234");
    }

    #[test]
    fn pow10_bounds() {
        assert_eq!(pow10(0), Some(U256::from(1u64)));
        assert_eq!(pow10(8), Some(U256::from(100_000_000u64)));
        assert!(pow10(77).is_some());
        assert_eq!(pow10(78), None);
    }
}
