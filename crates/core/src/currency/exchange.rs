//! Exchange rate types and rate resolution.

use chrono::NaiveDate;
use folio_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange rate between two currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Source currency code.
    pub from_currency: CurrencyCode,
    /// Target currency code.
    pub to_currency: CurrencyCode,
    /// Exchange rate (1 from_currency = rate to_currency).
    pub rate: Decimal,
    /// Date this rate is effective.
    pub effective_date: NaiveDate,
}

impl ExchangeRate {
    /// Creates a new exchange rate.
    #[must_use]
    pub const fn new(
        from_currency: CurrencyCode,
        to_currency: CurrencyCode,
        rate: Decimal,
        effective_date: NaiveDate,
    ) -> Self {
        Self {
            from_currency,
            to_currency,
            rate,
            effective_date,
        }
    }

    /// Returns the inverse rate at full precision, or `None` for a zero rate.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let rate = Decimal::ONE.checked_div(self.rate)?;
        Some(Self {
            from_currency: self.to_currency.clone(),
            to_currency: self.from_currency.clone(),
            rate,
            effective_date: self.effective_date,
        })
    }

    fn quotes(&self, from: &CurrencyCode, to: &CurrencyCode, date: NaiveDate) -> bool {
        &self.from_currency == from && &self.to_currency == to && self.effective_date <= date
    }
}

/// Where a resolved rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    /// Source and target currency are the same.
    Identity,
    /// A stored rate quoted in the requested direction.
    Direct,
    /// Reciprocal of a stored rate quoted in the opposite direction.
    Inverse,
    /// No usable rate was found, 1 was assumed.
    Default,
}

/// Result of a rate lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRate {
    /// Rate to multiply foreign amounts by.
    pub rate: Decimal,
    /// Effective date of the stored rate, if one was used.
    pub effective_date: Option<NaiveDate>,
    /// How the rate was obtained.
    pub source: RateSource,
}

impl ResolvedRate {
    const fn fixed(source: RateSource) -> Self {
        Self {
            rate: Decimal::ONE,
            effective_date: None,
            source,
        }
    }
}

/// Resolves the rate from `from` to `to` on `date`.
///
/// Prefers the latest direct rate effective on or before `date`, then the
/// inverse of the latest opposite-direction rate, then falls back to 1.
#[must_use]
pub fn resolve_rate(
    rates: &[ExchangeRate],
    from: &CurrencyCode,
    to: &CurrencyCode,
    date: NaiveDate,
) -> ResolvedRate {
    if from == to {
        return ResolvedRate::fixed(RateSource::Identity);
    }

    if let Some(direct) = latest(rates, from, to, date) {
        return ResolvedRate {
            rate: direct.rate,
            effective_date: Some(direct.effective_date),
            source: RateSource::Direct,
        };
    }

    if let Some(inverse) = latest(rates, to, from, date).and_then(ExchangeRate::inverse) {
        return ResolvedRate {
            rate: inverse.rate,
            effective_date: Some(inverse.effective_date),
            source: RateSource::Inverse,
        };
    }

    ResolvedRate::fixed(RateSource::Default)
}

fn latest<'a>(
    rates: &'a [ExchangeRate],
    from: &CurrencyCode,
    to: &CurrencyCode,
    date: NaiveDate,
) -> Option<&'a ExchangeRate> {
    rates
        .iter()
        .filter(|r| r.quotes(from, to, date))
        .max_by_key(|r| r.effective_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rate(from: &str, to: &str, rate: Decimal, on: NaiveDate) -> ExchangeRate {
        ExchangeRate::new(code(from), code(to), rate, on)
    }

    #[test]
    fn test_identity_rate() {
        let resolved = resolve_rate(&[], &code("USD"), &code("USD"), date(2024, 1, 1));
        assert_eq!(resolved.rate, Decimal::ONE);
        assert_eq!(resolved.source, RateSource::Identity);
    }

    #[test]
    fn test_latest_direct_rate_on_or_before_date() {
        let rates = vec![
            rate("EUR", "USD", dec!(1.05), date(2024, 1, 1)),
            rate("EUR", "USD", dec!(1.10), date(2024, 2, 1)),
            rate("EUR", "USD", dec!(1.20), date(2024, 3, 1)),
        ];

        let resolved = resolve_rate(&rates, &code("EUR"), &code("USD"), date(2024, 2, 15));
        assert_eq!(resolved.rate, dec!(1.10));
        assert_eq!(resolved.effective_date, Some(date(2024, 2, 1)));
        assert_eq!(resolved.source, RateSource::Direct);

        // Same-day rate counts as effective
        let resolved = resolve_rate(&rates, &code("EUR"), &code("USD"), date(2024, 3, 1));
        assert_eq!(resolved.rate, dec!(1.20));
    }

    #[test]
    fn test_inverse_rate_fallback() {
        let rates = vec![rate("USD", "EUR", dec!(0.8), date(2024, 1, 1))];
        let resolved = resolve_rate(&rates, &code("EUR"), &code("USD"), date(2024, 6, 1));
        assert_eq!(resolved.rate, dec!(1.25));
        assert_eq!(resolved.source, RateSource::Inverse);
    }

    #[test]
    fn test_direct_preferred_over_inverse() {
        let rates = vec![
            rate("USD", "EUR", dec!(0.5), date(2024, 5, 1)),
            rate("EUR", "USD", dec!(1.1), date(2024, 1, 1)),
        ];
        let resolved = resolve_rate(&rates, &code("EUR"), &code("USD"), date(2024, 6, 1));
        assert_eq!(resolved.rate, dec!(1.1));
    }

    #[test]
    fn test_future_rates_are_ignored() {
        let rates = vec![rate("EUR", "USD", dec!(1.1), date(2024, 7, 1))];
        let resolved = resolve_rate(&rates, &code("EUR"), &code("USD"), date(2024, 6, 1));
        assert_eq!(resolved.rate, Decimal::ONE);
        assert_eq!(resolved.effective_date, None);
        assert_eq!(resolved.source, RateSource::Default);
    }

    #[test]
    fn test_zero_rate_has_no_inverse() {
        let zero = rate("USD", "EUR", Decimal::ZERO, date(2024, 1, 1));
        assert!(zero.inverse().is_none());

        let resolved = resolve_rate(&[zero], &code("EUR"), &code("USD"), date(2024, 6, 1));
        assert_eq!(resolved.source, RateSource::Default);
    }
}
