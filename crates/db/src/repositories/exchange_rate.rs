//! Exchange rate repository.
//!
//! Rates are stored as quoted. Lookups load the stored rates for a pair
//! in both directions and resolve them with [`resolve_rate`], so the
//! database and the ledger recorder agree on which rate applies.

use chrono::{NaiveDate, Utc};
use folio_core::FinanceError;
use folio_core::currency::{ExchangeRate, ResolvedRate, resolve_rate};
use folio_shared::types::{CompanyId, CurrencyCode, UserId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, sea_query::Condition,
};
use uuid::Uuid;

use super::convert::{self, db_err};
use crate::entities::exchange_rates;

/// Exchange rate repository.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    db: DatabaseConnection,
}

impl ExchangeRateRepository {
    /// Creates a new exchange rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates or replaces the rate for a pair on its effective date.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the rate is not positive or both
    /// currencies are the same.
    pub async fn upsert_rate(
        &self,
        company_id: CompanyId,
        rate: &ExchangeRate,
        created_by: Option<UserId>,
    ) -> Result<ExchangeRate, FinanceError> {
        if rate.rate <= Decimal::ZERO {
            return Err(FinanceError::InvalidInput(format!(
                "exchange rate must be positive, got {}",
                rate.rate
            )));
        }
        if rate.from_currency == rate.to_currency {
            return Err(FinanceError::InvalidInput(format!(
                "exchange rate needs two different currencies, got {} twice",
                rate.from_currency
            )));
        }

        let existing = exchange_rates::Entity::find()
            .filter(exchange_rates::Column::CompanyId.eq(company_id.into_inner()))
            .filter(exchange_rates::Column::FromCurrency.eq(rate.from_currency.as_str()))
            .filter(exchange_rates::Column::ToCurrency.eq(rate.to_currency.as_str()))
            .filter(exchange_rates::Column::EffectiveDate.eq(rate.effective_date))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let stored = if let Some(existing) = existing {
            let mut active: exchange_rates::ActiveModel = existing.into();
            active.rate = Set(rate.rate);
            if created_by.is_some() {
                active.created_by = Set(created_by.map(UserId::into_inner));
            }
            active.update(&self.db).await.map_err(db_err)?
        } else {
            exchange_rates::ActiveModel {
                id: Set(Uuid::now_v7()),
                company_id: Set(company_id.into_inner()),
                from_currency: Set(rate.from_currency.as_str().to_string()),
                to_currency: Set(rate.to_currency.as_str().to_string()),
                rate: Set(rate.rate),
                effective_date: Set(rate.effective_date),
                created_by: Set(created_by.map(UserId::into_inner)),
                created_at: Set(convert::tz(Utc::now())),
            }
            .insert(&self.db)
            .await
            .map_err(db_err)?
        };

        tracing::info!(
            company_id = %company_id,
            from = %rate.from_currency,
            to = %rate.to_currency,
            rate = %rate.rate,
            effective_date = %rate.effective_date,
            "exchange rate stored"
        );
        convert::exchange_rate(&stored)
    }

    /// Resolves the rate from `from` to `to` on `date`.
    ///
    /// Falls back to an inverted opposite-direction rate, then to 1; the
    /// returned [`ResolvedRate`] says which.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the query fails.
    pub async fn find_rate(
        &self,
        company_id: CompanyId,
        from: &CurrencyCode,
        to: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<ResolvedRate, FinanceError> {
        let rates = load_pair_rates(&self.db, company_id, from, to, date).await?;
        Ok(resolve_rate(&rates, from, to, date))
    }
}

/// Loads stored rates for a pair, in both directions, effective on or before `date`.
pub(crate) async fn load_pair_rates<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    from: &CurrencyCode,
    to: &CurrencyCode,
    date: NaiveDate,
) -> Result<Vec<ExchangeRate>, FinanceError> {
    let direct = Condition::all()
        .add(exchange_rates::Column::FromCurrency.eq(from.as_str()))
        .add(exchange_rates::Column::ToCurrency.eq(to.as_str()));
    let inverse = Condition::all()
        .add(exchange_rates::Column::FromCurrency.eq(to.as_str()))
        .add(exchange_rates::Column::ToCurrency.eq(from.as_str()));

    exchange_rates::Entity::find()
        .filter(exchange_rates::Column::CompanyId.eq(company_id.into_inner()))
        .filter(exchange_rates::Column::EffectiveDate.lte(date))
        .filter(Condition::any().add(direct).add(inverse))
        .order_by_desc(exchange_rates::Column::EffectiveDate)
        .all(conn)
        .await
        .map_err(db_err)?
        .iter()
        .map(convert::exchange_rate)
        .collect()
}
