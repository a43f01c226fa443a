//! Resolution of a posting date to its fiscal year and accounting period.

use chrono::NaiveDate;
use folio_shared::types::CompanyId;

use super::period::{AccountingPeriod, FiscalYear};
use crate::error::FinanceError;

/// Fiscal year and accounting period a date falls in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPeriod {
    /// Fiscal year containing the date.
    pub fiscal_year: FiscalYear,
    /// Accounting period containing the date.
    pub period: AccountingPeriod,
}

/// Fiscal years and accounting periods known for one or more companies.
#[derive(Debug, Clone, Default)]
pub struct FiscalCalendar {
    years: Vec<FiscalYear>,
    periods: Vec<AccountingPeriod>,
}

impl FiscalCalendar {
    /// Creates a calendar from loaded years and periods.
    #[must_use]
    pub fn new(mut years: Vec<FiscalYear>, mut periods: Vec<AccountingPeriod>) -> Self {
        years.sort_by_key(|y| y.start_date);
        periods.sort_by_key(|p| p.start_date);
        Self { years, periods }
    }

    /// Returns the fiscal years in start date order.
    #[must_use]
    pub fn years(&self) -> &[FiscalYear] {
        &self.years
    }

    /// Returns the accounting periods in start date order.
    #[must_use]
    pub fn periods(&self) -> &[AccountingPeriod] {
        &self.periods
    }

    /// Finds the fiscal year and period containing `date` for the company.
    ///
    /// Both range ends are inclusive. The period's status is not checked.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::PeriodNotFound` if either lookup fails.
    pub fn resolve(
        &self,
        company_id: CompanyId,
        date: NaiveDate,
    ) -> Result<ResolvedPeriod, FinanceError> {
        let not_found = || FinanceError::PeriodNotFound { company_id, date };

        let fiscal_year = self
            .years
            .iter()
            .find(|y| y.company_id == company_id && y.contains_date(date))
            .ok_or_else(not_found)?;

        let period = self
            .periods
            .iter()
            .find(|p| p.fiscal_year_id == fiscal_year.id && p.contains_date(date))
            .ok_or_else(not_found)?;

        Ok(ResolvedPeriod {
            fiscal_year: fiscal_year.clone(),
            period: period.clone(),
        })
    }

    /// Resolves `date` and requires the period to be open.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` or `PeriodClosed`.
    pub fn resolve_open(
        &self,
        company_id: CompanyId,
        date: NaiveDate,
    ) -> Result<ResolvedPeriod, FinanceError> {
        let resolved = self.resolve(company_id, date)?;
        if !resolved.period.is_open() {
            return Err(FinanceError::PeriodClosed {
                company_id,
                date,
                period: resolved.period.name.clone(),
            });
        }
        Ok(resolved)
    }

    /// Checks the calendar for malformed or overlapping ranges.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::InvalidInput` describing the first problem found.
    pub fn validate(&self) -> Result<(), FinanceError> {
        for year in &self.years {
            if year.start_date > year.end_date {
                return Err(FinanceError::InvalidInput(format!(
                    "fiscal year {} ends before it starts",
                    year.name
                )));
            }
        }

        for year in &self.years {
            let overlapping = self.years.iter().any(|other| {
                other.id != year.id
                    && other.company_id == year.company_id
                    && other.start_date <= year.end_date
                    && other.end_date >= year.start_date
            });
            if overlapping {
                return Err(FinanceError::InvalidInput(format!(
                    "fiscal year {} overlaps another fiscal year",
                    year.name
                )));
            }
        }

        for period in &self.periods {
            let Some(year) = self.years.iter().find(|y| y.id == period.fiscal_year_id) else {
                return Err(FinanceError::InvalidInput(format!(
                    "period {} references an unknown fiscal year",
                    period.name
                )));
            };
            if period.start_date > period.end_date {
                return Err(FinanceError::InvalidInput(format!(
                    "period {} ends before it starts",
                    period.name
                )));
            }
            if period.start_date < year.start_date || period.end_date > year.end_date {
                return Err(FinanceError::InvalidInput(format!(
                    "period {} lies outside fiscal year {}",
                    period.name, year.name
                )));
            }
        }

        // Periods are sorted by start date, so overlap only needs neighbours.
        for year in &self.years {
            let mut previous: Option<&AccountingPeriod> = None;
            for period in self.periods.iter().filter(|p| p.fiscal_year_id == year.id) {
                if let Some(prev) = previous
                    && period.start_date <= prev.end_date
                {
                    return Err(FinanceError::InvalidInput(format!(
                        "period {} overlaps period {}",
                        period.name, prev.name
                    )));
                }
                previous = Some(period);
            }
        }

        Ok(())
    }
}
