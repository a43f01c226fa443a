//! Fiscal calendar and exchange rate storage against a real database.

#![allow(clippy::unwrap_used)]

mod common;

use common::{connect, date, open_fiscal_year, usd};
use folio_core::FinanceError;
use folio_core::currency::{ExchangeRate, RateSource};
use folio_core::fiscal::PeriodStatus;
use folio_db::repositories::{CreateFiscalYearInput, ExchangeRateRepository, FiscalRepository};
use folio_shared::types::{CompanyId, CurrencyCode, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ============================================================================
// Fiscal years and periods
// ============================================================================

#[tokio::test]
async fn test_create_fiscal_year_generates_monthly_periods() {
    let db = connect().await;
    let company_id = CompanyId::new();

    let year = open_fiscal_year(&db, company_id).await;
    assert_eq!(year.periods.len(), 12);
    assert_eq!(year.periods[1].name, "February 2024");
    assert_eq!(year.periods[1].end_date, date(2024, 2, 29));

    let calendar = FiscalRepository::new(db.clone())
        .load_calendar(company_id)
        .await
        .unwrap();
    let resolved = calendar.resolve_open(company_id, date(2024, 8, 15)).unwrap();
    assert_eq!(resolved.period.period_number, 8);
}

#[tokio::test]
async fn test_overlapping_fiscal_year_is_rejected() {
    let db = connect().await;
    let company_id = CompanyId::new();
    open_fiscal_year(&db, company_id).await;

    let result = FiscalRepository::new(db.clone())
        .create_fiscal_year(CreateFiscalYearInput {
            company_id,
            name: "FY2024-mid".into(),
            start_date: date(2024, 7, 1),
            end_date: date(2025, 6, 30),
        })
        .await;
    assert!(matches!(result, Err(FinanceError::InvalidInput(_))));
}

#[tokio::test]
async fn test_periods_close_in_order() {
    let db = connect().await;
    let company_id = CompanyId::new();
    let year = open_fiscal_year(&db, company_id).await;
    let repo = FiscalRepository::new(db.clone());
    let closer = UserId::new();

    let out_of_order = repo.close_period(year.periods[1].id, closer).await;
    assert!(matches!(out_of_order, Err(FinanceError::InvalidState { .. })));

    let january = repo.close_period(year.periods[0].id, closer).await.unwrap();
    assert_eq!(january.status, PeriodStatus::Closed);

    let again = repo.close_period(year.periods[0].id, closer).await;
    assert!(matches!(again, Err(FinanceError::InvalidState { .. })));

    let calendar = repo.load_calendar(company_id).await.unwrap();
    assert!(matches!(
        calendar.resolve_open(company_id, date(2024, 1, 31)),
        Err(FinanceError::PeriodClosed { .. })
    ));

    let reopened = repo.reopen_period(year.periods[0].id).await.unwrap();
    assert_eq!(reopened.status, PeriodStatus::Open);
}

// ============================================================================
// Exchange rates
// ============================================================================

#[tokio::test]
async fn test_rate_lookup_prefers_latest_direct_rate() {
    let db = connect().await;
    let company_id = CompanyId::new();
    let repo = ExchangeRateRepository::new(db);
    let eur = CurrencyCode::parse("EUR").unwrap();

    repo.upsert_rate(company_id, &ExchangeRate::new(eur.clone(), usd(), dec!(1.08), date(2024, 1, 1)), None)
        .await
        .unwrap();
    repo.upsert_rate(company_id, &ExchangeRate::new(eur.clone(), usd(), dec!(1.10), date(2024, 2, 1)), None)
        .await
        .unwrap();
    // Same pair and date replaces the stored rate.
    repo.upsert_rate(company_id, &ExchangeRate::new(eur.clone(), usd(), dec!(1.12), date(2024, 2, 1)), None)
        .await
        .unwrap();

    let resolved = repo.find_rate(company_id, &eur, &usd(), date(2024, 2, 20)).await.unwrap();
    assert_eq!(resolved.rate, dec!(1.12));
    assert_eq!(resolved.source, RateSource::Direct);
    assert_eq!(resolved.effective_date, Some(date(2024, 2, 1)));

    let january = repo.find_rate(company_id, &eur, &usd(), date(2024, 1, 31)).await.unwrap();
    assert_eq!(january.rate, dec!(1.08));
}

#[tokio::test]
async fn test_rate_lookup_falls_back_to_inverse_then_one() {
    let db = connect().await;
    let company_id = CompanyId::new();
    let repo = ExchangeRateRepository::new(db);
    let eur = CurrencyCode::parse("EUR").unwrap();
    let gbp = CurrencyCode::parse("GBP").unwrap();

    repo.upsert_rate(company_id, &ExchangeRate::new(usd(), eur.clone(), dec!(0.8), date(2024, 1, 1)), None)
        .await
        .unwrap();

    let inverse = repo.find_rate(company_id, &eur, &usd(), date(2024, 3, 1)).await.unwrap();
    assert_eq!(inverse.source, RateSource::Inverse);
    assert_eq!(inverse.rate, dec!(1.25));

    let missing = repo.find_rate(company_id, &gbp, &usd(), date(2024, 3, 1)).await.unwrap();
    assert_eq!(missing.source, RateSource::Default);
    assert_eq!(missing.rate, Decimal::ONE);
}

#[tokio::test]
async fn test_invalid_rates_are_rejected() {
    let db = connect().await;
    let repo = ExchangeRateRepository::new(db);
    let company_id = CompanyId::new();

    let zero = repo
        .upsert_rate(
            company_id,
            &ExchangeRate::new(CurrencyCode::parse("EUR").unwrap(), usd(), Decimal::ZERO, date(2024, 1, 1)),
            None,
        )
        .await;
    assert!(matches!(zero, Err(FinanceError::InvalidInput(_))));

    let same = repo
        .upsert_rate(company_id, &ExchangeRate::new(usd(), usd(), dec!(1), date(2024, 1, 1)), None)
        .await;
    assert!(matches!(same, Err(FinanceError::InvalidInput(_))));
}
