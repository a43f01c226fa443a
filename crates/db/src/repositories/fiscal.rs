//! Fiscal year and accounting period repository.

use chrono::{Datelike, NaiveDate, Utc};
use folio_core::FinanceError;
use folio_core::fiscal::{AccountingPeriod, FiscalCalendar, FiscalYear, PeriodStatus};
use folio_shared::types::{AccountingPeriodId, CompanyId, FiscalYearId, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::convert::{self, db_err};
use crate::entities::{accounting_periods, fiscal_years, sea_orm_active_enums as db};

/// Input for creating a fiscal year.
#[derive(Debug, Clone)]
pub struct CreateFiscalYearInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Year name (e.g., "FY2026").
    pub name: String,
    /// First day of the year.
    pub start_date: NaiveDate,
    /// Last day of the year (inclusive).
    pub end_date: NaiveDate,
}

/// Fiscal year with its periods.
#[derive(Debug, Clone)]
pub struct FiscalYearWithPeriods {
    /// The fiscal year.
    pub fiscal_year: FiscalYear,
    /// Its accounting periods, in period number order.
    pub periods: Vec<AccountingPeriod>,
}

/// Fiscal year and period repository.
#[derive(Debug, Clone)]
pub struct FiscalRepository {
    db: DatabaseConnection,
}

impl FiscalRepository {
    /// Creates a new fiscal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a fiscal year with one open period per calendar month.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the year ends before it starts or overlaps
    /// an existing year of the company.
    pub async fn create_fiscal_year(
        &self,
        input: CreateFiscalYearInput,
    ) -> Result<FiscalYearWithPeriods, FinanceError> {
        if input.start_date >= input.end_date {
            return Err(FinanceError::InvalidInput(format!(
                "fiscal year {} must start before it ends",
                input.name
            )));
        }

        let txn = self.db.begin().await.map_err(db_err)?;

        let fiscal_year = FiscalYear {
            id: FiscalYearId::new(),
            company_id: input.company_id,
            name: input.name,
            start_date: input.start_date,
            end_date: input.end_date,
        };
        let periods = generate_monthly_periods(&fiscal_year);

        let existing = load_calendar(&txn, input.company_id).await?;
        let mut years = existing.years().to_vec();
        years.push(fiscal_year.clone());
        let mut all_periods = existing.periods().to_vec();
        all_periods.extend(periods.iter().cloned());
        FiscalCalendar::new(years, all_periods).validate()?;

        let now = convert::tz(Utc::now());
        fiscal_years::ActiveModel {
            id: Set(fiscal_year.id.into_inner()),
            company_id: Set(fiscal_year.company_id.into_inner()),
            name: Set(fiscal_year.name.clone()),
            start_date: Set(fiscal_year.start_date),
            end_date: Set(fiscal_year.end_date),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        for period in &periods {
            accounting_periods::ActiveModel {
                id: Set(period.id.into_inner()),
                company_id: Set(fiscal_year.company_id.into_inner()),
                fiscal_year_id: Set(fiscal_year.id.into_inner()),
                period_number: Set(period.period_number),
                name: Set(period.name.clone()),
                start_date: Set(period.start_date),
                end_date: Set(period.end_date),
                status: Set(db::PeriodStatus::Open),
                closed_by: Set(None),
                closed_at: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            fiscal_year_id = %fiscal_year.id,
            company_id = %fiscal_year.company_id,
            periods = periods.len(),
            "fiscal year created"
        );

        Ok(FiscalYearWithPeriods {
            fiscal_year,
            periods,
        })
    }

    /// Loads every fiscal year and period of a company.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the query fails.
    pub async fn load_calendar(&self, company_id: CompanyId) -> Result<FiscalCalendar, FinanceError> {
        load_calendar(&self.db, company_id).await
    }

    /// Closes a period. Earlier periods of the same year must already be closed.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the period does not exist
    /// - `InvalidState` if it is already closed or an earlier period is open
    pub async fn close_period(
        &self,
        period_id: AccountingPeriodId,
        closed_by: UserId,
    ) -> Result<AccountingPeriod, FinanceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let period = lock_period(&txn, period_id).await?;

        if period.status == db::PeriodStatus::Closed {
            return Err(period_state_error(&period.name, PeriodStatus::Closed, "open"));
        }

        let earlier_open = accounting_periods::Entity::find()
            .filter(accounting_periods::Column::FiscalYearId.eq(period.fiscal_year_id))
            .filter(accounting_periods::Column::PeriodNumber.lt(period.period_number))
            .filter(accounting_periods::Column::Status.eq(db::PeriodStatus::Open))
            .one(&txn)
            .await
            .map_err(db_err)?;
        if let Some(earlier) = earlier_open {
            return Err(FinanceError::InvalidState {
                document: format!("accounting period {}", period.name),
                current: format!("preceded by open period {}", earlier.name),
                required: "earlier periods closed".to_string(),
            });
        }

        let now = convert::tz(Utc::now());
        let mut active: accounting_periods::ActiveModel = period.into();
        active.status = Set(db::PeriodStatus::Closed);
        active.closed_by = Set(Some(closed_by.into_inner()));
        active.closed_at = Set(Some(now));
        active.updated_at = Set(now);
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(period_id = %period_id, closed_by = %closed_by, "accounting period closed");
        Ok(convert::accounting_period(updated))
    }

    /// Reopens a closed period.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the period does not exist
    /// - `InvalidState` if it is already open
    pub async fn reopen_period(
        &self,
        period_id: AccountingPeriodId,
    ) -> Result<AccountingPeriod, FinanceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let period = lock_period(&txn, period_id).await?;

        if period.status == db::PeriodStatus::Open {
            return Err(period_state_error(&period.name, PeriodStatus::Open, "closed"));
        }

        let mut active: accounting_periods::ActiveModel = period.into();
        active.status = Set(db::PeriodStatus::Open);
        active.closed_by = Set(None);
        active.closed_at = Set(None);
        active.updated_at = Set(convert::tz(Utc::now()));
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(period_id = %period_id, "accounting period reopened");
        Ok(convert::accounting_period(updated))
    }
}

/// Loads a company's calendar on any connection.
pub(crate) async fn load_calendar<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
) -> Result<FiscalCalendar, FinanceError> {
    let years = fiscal_years::Entity::find()
        .filter(fiscal_years::Column::CompanyId.eq(company_id.into_inner()))
        .order_by_asc(fiscal_years::Column::StartDate)
        .all(conn)
        .await
        .map_err(db_err)?;
    let periods = accounting_periods::Entity::find()
        .filter(accounting_periods::Column::CompanyId.eq(company_id.into_inner()))
        .order_by_asc(accounting_periods::Column::StartDate)
        .all(conn)
        .await
        .map_err(db_err)?;

    Ok(FiscalCalendar::new(
        years.into_iter().map(convert::fiscal_year).collect(),
        periods.into_iter().map(convert::accounting_period).collect(),
    ))
}

async fn lock_period<C: ConnectionTrait>(
    conn: &C,
    period_id: AccountingPeriodId,
) -> Result<accounting_periods::Model, FinanceError> {
    accounting_periods::Entity::find_by_id(period_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| FinanceError::NotFound(format!("accounting period {period_id}")))
}

fn period_state_error(name: &str, current: PeriodStatus, required: &str) -> FinanceError {
    FinanceError::InvalidState {
        document: format!("accounting period {name}"),
        current: current.to_string(),
        required: required.to_string(),
    }
}

/// Splits a fiscal year into calendar-month periods, clipped to the year.
fn generate_monthly_periods(year: &FiscalYear) -> Vec<AccountingPeriod> {
    let mut periods = Vec::new();
    let mut current = year.start_date;
    let mut period_number = 1;

    while current <= year.end_date {
        let month_end = last_day_of_month(current).min(year.end_date);

        periods.push(AccountingPeriod {
            id: AccountingPeriodId::new(),
            fiscal_year_id: year.id,
            period_number,
            name: current.format("%B %Y").to_string(),
            start_date: current,
            end_date: month_end,
            status: PeriodStatus::Open,
        });

        let Some(next) = month_end.succ_opt() else {
            break;
        };
        current = next;
        period_number += 1;
    }

    periods
}

/// Returns the last day of the month containing `date`.
fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}
