//! Reversal of posted journal entries.
//!
//! A posted entry is never edited. Reversing it creates a second posted
//! entry whose lines swap debit and credit, and links the two.

use chrono::NaiveDate;
use folio_shared::types::{JournalEntryId, JournalLineId, UserId};

use super::posting::PostingContext;
use super::types::{
    JournalEntry, JournalEntryType, JournalLine, JournalReference, JournalStatus, ReferenceType,
};
use super::validation::validate_lines;
use crate::collab::{Capability, NumberSeries};
use crate::error::FinanceError;

/// What to reverse.
#[derive(Debug, Clone, Copy)]
pub struct ReversalRequest<'a> {
    /// Posted entry to reverse.
    pub entry: &'a JournalEntry,
    /// Date of the reversing entry.
    pub reversal_date: NaiveDate,
    /// Why the entry is reversed.
    pub reason: &'a str,
}

/// Writes produced by a reversal.
#[derive(Debug, Clone)]
pub struct ReversalOutcome {
    /// New posted entry of type `reversing`.
    pub reversing_entry: JournalEntry,
    /// Original entry with `reversal_entry_id` set.
    pub original: JournalEntry,
    /// User who reversed.
    pub reversed_by: UserId,
}

/// Stateless reversal service.
pub struct ReversalService;

impl ReversalService {
    /// Creates the reversing entry for a posted journal entry.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` without `Capability::ReverseEntry`
    /// - `BlankReason` if `reason` is blank
    /// - `InvalidState` if the entry is not posted
    /// - `AlreadyReversed` if a reversal exists
    /// - `PeriodNotFound` / `PeriodClosed` for the reversal date
    pub fn reverse(
        request: ReversalRequest<'_>,
        ctx: PostingContext<'_>,
    ) -> Result<ReversalOutcome, FinanceError> {
        let reversed_by = ctx.authorizer.authorize(Capability::ReverseEntry)?;
        let original = request.entry;

        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(FinanceError::BlankReason);
        }
        if !original.is_posted() {
            return Err(FinanceError::InvalidState {
                document: format!("journal entry {}", original.entry_number),
                current: original.status.to_string(),
                required: JournalStatus::Posted.to_string(),
            });
        }
        if let Some(reversal_entry_id) = original.reversal_entry_id {
            return Err(FinanceError::AlreadyReversed {
                entry_id: original.id,
                reversal_entry_id,
            });
        }

        let resolved = ctx
            .calendar
            .resolve_open(original.company_id, request.reversal_date)?;

        let lines = Self::swap_lines(&original.lines);
        let totals = validate_lines(&lines)?;

        let reversing_entry = JournalEntry {
            id: JournalEntryId::new(),
            entry_number: ctx
                .numbering
                .next_number(NumberSeries::JournalEntry, original.company_id),
            company_id: original.company_id,
            fiscal_year_id: resolved.fiscal_year.id,
            accounting_period_id: resolved.period.id,
            entry_type: JournalEntryType::Reversing,
            entry_date: request.reversal_date,
            currency: original.currency.clone(),
            exchange_rate: original.exchange_rate,
            description: format!("Reversal of {}: {reason}", original.entry_number),
            reference: JournalReference {
                reference_type: ReferenceType::JournalEntry,
                reference_id: original.id.into_inner(),
                reference_number: original.entry_number.clone(),
            },
            total_debit: totals.debit,
            total_credit: totals.credit,
            status: JournalStatus::Posted,
            posted_by: Some(reversed_by),
            posted_at: Some(ctx.now),
            reversal_of: Some(original.id),
            reversal_entry_id: None,
            lines,
        };

        let mut original = original.clone();
        original.reversal_entry_id = Some(reversing_entry.id);

        Ok(ReversalOutcome {
            reversing_entry,
            original,
            reversed_by,
        })
    }

    /// Swaps debit and credit on every line, keeping order and accounts.
    #[must_use]
    pub fn swap_lines(lines: &[JournalLine]) -> Vec<JournalLine> {
        lines
            .iter()
            .map(|line| JournalLine {
                id: JournalLineId::new(),
                line_number: line.line_number,
                account_id: line.account_id,
                debit: line.credit,
                credit: line.debit,
                base_debit: line.base_credit,
                base_credit: line.base_debit,
                description: Some(match &line.description {
                    Some(d) => format!("Reversal: {d}"),
                    None => "Reversal".to_string(),
                }),
                cost_center_id: line.cost_center_id,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{GrantedCapabilities, SequentialNumbering};
    use crate::fiscal::{AccountingPeriod, FiscalCalendar, FiscalYear, PeriodStatus};
    use chrono::Utc;
    use folio_shared::types::{
        AccountId, AccountingPeriodId, CompanyId, CurrencyCode, FiscalYearId,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar(company: CompanyId) -> FiscalCalendar {
        let fy = FiscalYear {
            id: FiscalYearId::new(),
            company_id: company,
            name: "FY2024".into(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
        };
        let periods = vec![
            AccountingPeriod {
                id: AccountingPeriodId::new(),
                fiscal_year_id: fy.id,
                period_number: 1,
                name: "H1".into(),
                start_date: date(2024, 1, 1),
                end_date: date(2024, 6, 30),
                status: PeriodStatus::Closed,
            },
            AccountingPeriod {
                id: AccountingPeriodId::new(),
                fiscal_year_id: fy.id,
                period_number: 2,
                name: "H2".into(),
                start_date: date(2024, 7, 1),
                end_date: date(2024, 12, 31),
                status: PeriodStatus::Open,
            },
        ];
        FiscalCalendar::new(vec![fy], periods)
    }

    fn line(n: i32, debit: Decimal, credit: Decimal) -> JournalLine {
        JournalLine {
            id: JournalLineId::new(),
            line_number: n,
            account_id: AccountId::new(),
            debit,
            credit,
            base_debit: debit,
            base_credit: credit,
            description: Some("Office supplies".into()),
            cost_center_id: None,
        }
    }

    fn posted_entry(company: CompanyId) -> JournalEntry {
        let lines = vec![
            line(1, dec!(700), dec!(0)),
            line(2, dec!(300), dec!(0)),
            line(3, dec!(0), dec!(1000)),
        ];
        JournalEntry {
            id: JournalEntryId::new(),
            entry_number: "JE-000010".into(),
            company_id: company,
            fiscal_year_id: FiscalYearId::new(),
            accounting_period_id: AccountingPeriodId::new(),
            entry_type: JournalEntryType::Automatic,
            entry_date: date(2024, 3, 1),
            currency: CurrencyCode::parse("USD").unwrap(),
            exchange_rate: Decimal::ONE,
            description: "Supplier invoice SI-1".into(),
            reference: JournalReference {
                reference_type: ReferenceType::SupplierInvoice,
                reference_id: Uuid::now_v7(),
                reference_number: "SI-1".into(),
            },
            total_debit: dec!(1000),
            total_credit: dec!(1000),
            status: JournalStatus::Posted,
            posted_by: None,
            posted_at: None,
            reversal_of: None,
            reversal_entry_id: None,
            lines,
        }
    }

    struct Env {
        calendar: FiscalCalendar,
        base: CurrencyCode,
        numbering: SequentialNumbering,
        auth: GrantedCapabilities,
    }

    impl Env {
        fn new(company: CompanyId) -> Self {
            Self {
                calendar: calendar(company),
                base: CurrencyCode::parse("USD").unwrap(),
                numbering: SequentialNumbering::starting_at("JE", 11),
                auth: GrantedCapabilities::all(UserId::new()),
            }
        }

        fn ctx(&self) -> PostingContext<'_> {
            PostingContext {
                calendar: &self.calendar,
                base_currency: &self.base,
                numbering: &self.numbering,
                authorizer: &self.auth,
                now: Utc::now(),
            }
        }
    }

    #[test]
    fn test_reverse_negates_lines() {
        let company = CompanyId::new();
        let env = Env::new(company);
        let entry = posted_entry(company);

        let out = ReversalService::reverse(
            ReversalRequest {
                entry: &entry,
                reversal_date: date(2024, 7, 2),
                reason: "entered twice",
            },
            env.ctx(),
        )
        .unwrap();

        let rev = &out.reversing_entry;
        assert_eq!(rev.entry_type, JournalEntryType::Reversing);
        assert_eq!(rev.status, JournalStatus::Posted);
        assert_eq!(rev.entry_number, "JE-000011");
        assert_eq!(rev.reversal_of, Some(entry.id));
        assert_eq!(rev.reference.reference_type, ReferenceType::JournalEntry);
        assert!(rev.totals().is_balanced());

        for (orig, reversed) in entry.lines.iter().zip(&rev.lines) {
            assert_eq!(reversed.account_id, orig.account_id);
            assert_eq!(reversed.signed_amount(), -orig.signed_amount());
        }

        assert_eq!(out.original.reversal_entry_id, Some(rev.id));
        assert_eq!(out.original.lines, entry.lines);
    }

    #[test]
    fn test_reverse_lands_in_reversal_date_period() {
        let company = CompanyId::new();
        let env = Env::new(company);
        let entry = posted_entry(company);

        // Original period (H1) is closed; reversing into H2 works.
        let out = ReversalService::reverse(
            ReversalRequest {
                entry: &entry,
                reversal_date: date(2024, 8, 1),
                reason: "wrong supplier",
            },
            env.ctx(),
        )
        .unwrap();
        let h2 = env.calendar.resolve(company, date(2024, 8, 1)).unwrap();
        assert_eq!(out.reversing_entry.accounting_period_id, h2.period.id);

        let err = ReversalService::reverse(
            ReversalRequest {
                entry: &entry,
                reversal_date: date(2024, 3, 2),
                reason: "wrong supplier",
            },
            env.ctx(),
        )
        .unwrap_err();
        assert!(matches!(err, FinanceError::PeriodClosed { .. }));
    }

    #[test]
    fn test_reverse_twice_fails() {
        let company = CompanyId::new();
        let env = Env::new(company);
        let entry = posted_entry(company);
        fn request(entry: &JournalEntry) -> ReversalRequest<'_> {
            ReversalRequest {
                entry,
                reversal_date: date(2024, 7, 2),
                reason: "duplicate",
            }
        }

        let out = ReversalService::reverse(request(&entry), env.ctx()).unwrap();
        let err = ReversalService::reverse(request(&out.original), env.ctx()).unwrap_err();
        assert!(matches!(err, FinanceError::AlreadyReversed { .. }));
    }

    #[test]
    fn test_reverse_requires_posted_entry() {
        let company = CompanyId::new();
        let env = Env::new(company);
        let mut entry = posted_entry(company);
        entry.status = JournalStatus::Draft;

        let err = ReversalService::reverse(
            ReversalRequest {
                entry: &entry,
                reversal_date: date(2024, 7, 2),
                reason: "not needed",
            },
            env.ctx(),
        )
        .unwrap_err();
        assert!(matches!(err, FinanceError::InvalidState { .. }));
    }

    #[test]
    fn test_reverse_requires_reason() {
        let company = CompanyId::new();
        let env = Env::new(company);
        let entry = posted_entry(company);

        let err = ReversalService::reverse(
            ReversalRequest {
                entry: &entry,
                reversal_date: date(2024, 7, 2),
                reason: "  ",
            },
            env.ctx(),
        )
        .unwrap_err();
        assert!(matches!(err, FinanceError::BlankReason));
    }
}
