//! Currency conversion logic.
//!
//! CRITICAL: Rounding strategy for multi-currency:
//! - Always round to money precision (4 decimal places)
//! - Use banker's rounding (round half to even)
//! - Store both original and converted amounts

use folio_shared::types::Money;
use rust_decimal::Decimal;

/// Converts a foreign amount into the base currency.
///
/// Uses banker's rounding (round half to even) to minimize cumulative errors.
#[must_use]
pub fn convert_to_base(amount: Decimal, rate: Decimal) -> Decimal {
    Money::round(amount * rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_convert_to_base() {
        // 100 USD * 15000 = 1,500,000 IDR
        assert_eq!(convert_to_base(dec!(100), dec!(15000)), dec!(1500000));
    }

    #[test]
    fn test_convert_with_rounding() {
        // 100.50 * 1.23456 = 124.07328 -> 124.0733
        assert_eq!(convert_to_base(dec!(100.50), dec!(1.23456)), dec!(124.0733));
    }

    #[test]
    fn test_bankers_rounding() {
        // 1 * 0.00005 rounds to even (0), 1 * 0.00015 rounds to 0.0002
        assert_eq!(convert_to_base(dec!(1), dec!(0.00005)), dec!(0));
        assert_eq!(convert_to_base(dec!(1), dec!(0.00015)), dec!(0.0002));
    }

    #[test]
    fn test_identity_rate() {
        assert_eq!(convert_to_base(dec!(1234.5678), Decimal::ONE), dec!(1234.5678));
    }
}
