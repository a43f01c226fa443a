//! Fixed-point money arithmetic and currency codes.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every monetary value is a `rust_decimal::Decimal` normalized to
//! [`MONEY_SCALE`] decimal places with banker's rounding.

use std::cmp::Ordering;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places every stored monetary amount carries.
pub const MONEY_SCALE: u32 = 4;

/// Stateless money arithmetic.
///
/// All operations are exact decimal operations followed by normalization to
/// four decimal places, so sums never drift the way binary floats do.
pub struct Money;

impl Money {
    /// Rounds a value to [`MONEY_SCALE`] places using banker's rounding.
    #[must_use]
    pub fn round(value: Decimal) -> Decimal {
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
    }

    /// Adds two amounts.
    #[must_use]
    pub fn add(a: Decimal, b: Decimal) -> Decimal {
        Self::round(a + b)
    }

    /// Subtracts `b` from `a`.
    #[must_use]
    pub fn sub(a: Decimal, b: Decimal) -> Decimal {
        Self::round(a - b)
    }

    /// Sums an iterator of amounts.
    #[must_use]
    pub fn sum<I>(values: I) -> Decimal
    where
        I: IntoIterator<Item = Decimal>,
    {
        Self::round(values.into_iter().sum())
    }

    /// Compares two amounts at money precision.
    ///
    /// `1.00005` and `1.0000` compare equal because both normalize to `1.0000`.
    #[must_use]
    pub fn cmp(a: Decimal, b: Decimal) -> Ordering {
        Self::round(a).cmp(&Self::round(b))
    }

    /// Returns true if both amounts are equal at money precision.
    #[must_use]
    pub fn eq(a: Decimal, b: Decimal) -> bool {
        Self::cmp(a, b) == Ordering::Equal
    }

    /// Returns true if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(value: Decimal) -> bool {
        Self::cmp(value, Decimal::ZERO) == Ordering::Greater
    }

    /// Returns true if an outstanding amount means the document is fully settled.
    #[must_use]
    pub fn is_settled(outstanding: Decimal) -> bool {
        Self::cmp(outstanding, Decimal::ZERO) != Ordering::Greater
    }
}

/// Error returned when parsing an invalid currency code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid currency code: {0:?}")]
pub struct CurrencyCodeError(pub String);

/// ISO 4217 style currency code (three uppercase ASCII letters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and normalizes a currency code.
    pub fn parse(code: &str) -> Result<Self, CurrencyCodeError> {
        let trimmed = code.trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(CurrencyCodeError(code.to_string()))
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_uses_bankers_rounding() {
        assert_eq!(Money::round(dec!(1.00005)), dec!(1.0000));
        assert_eq!(Money::round(dec!(1.00015)), dec!(1.0002));
        assert_eq!(Money::round(dec!(2.123456)), dec!(2.1235));
    }

    #[test]
    fn test_add_sub_are_exact() {
        // 0.1 + 0.2 drifts with floats, never with decimals
        assert_eq!(Money::add(dec!(0.1), dec!(0.2)), dec!(0.3));
        assert_eq!(Money::sub(dec!(3000), dec!(1500)), dec!(1500));
        assert_eq!(Money::sub(dec!(100), dec!(100.0001)), dec!(-0.0001));
    }

    #[test]
    fn test_sum() {
        let values = vec![dec!(0.1); 10];
        assert_eq!(Money::sum(values), dec!(1));
        assert_eq!(Money::sum(Vec::<Decimal>::new()), Decimal::ZERO);
    }

    #[test]
    fn test_cmp_at_money_precision() {
        assert!(Money::eq(dec!(1.00004), dec!(1)));
        assert_eq!(Money::cmp(dec!(1.0001), dec!(1)), Ordering::Greater);
        assert_eq!(Money::cmp(dec!(5), dec!(500.00)), Ordering::Less);
    }

    #[rstest]
    #[case(dec!(0), true)]
    #[case(dec!(-0.5), true)]
    #[case(dec!(0.00001), true)]
    #[case(dec!(0.0001), false)]
    #[case(dec!(1500), false)]
    fn test_is_settled(#[case] outstanding: Decimal, #[case] expected: bool) {
        assert_eq!(Money::is_settled(outstanding), expected);
    }

    #[test]
    fn test_is_positive() {
        assert!(Money::is_positive(dec!(0.0001)));
        assert!(!Money::is_positive(Decimal::ZERO));
        assert!(!Money::is_positive(dec!(-1)));
    }

    #[rstest]
    #[case("USD", "USD")]
    #[case("eur", "EUR")]
    #[case(" idr ", "IDR")]
    fn test_currency_code_parse(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(CurrencyCode::parse(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("US")]
    #[case("USDX")]
    #[case("U5D")]
    fn test_currency_code_rejects_invalid(#[case] input: &str) {
        assert!(CurrencyCode::parse(input).is_err());
    }

    #[test]
    fn test_currency_code_display() {
        let code: CurrencyCode = "sgd".parse().unwrap();
        assert_eq!(code.to_string(), "SGD");
    }
}
