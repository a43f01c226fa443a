//! Property-based tests for ReversalService.

use chrono::Utc;
use folio_shared::types::{
    AccountId, AccountingPeriodId, CompanyId, FiscalYearId, JournalEntryId, JournalLineId, UserId,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::collab::{GrantedCapabilities, SequentialNumbering};
use crate::document::types::fixtures::{date, usd};
use crate::fiscal::{AccountingPeriod, FiscalCalendar, FiscalYear, PeriodStatus};
use crate::journal::posting::PostingContext;
use crate::journal::reversal::{ReversalRequest, ReversalService};
use crate::journal::types::{
    JournalEntry, JournalEntryType, JournalLine, JournalReference, JournalStatus, JournalTotals,
    ReferenceType,
};

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn line(line_number: i32, debit: Decimal, credit: Decimal) -> JournalLine {
    JournalLine {
        id: JournalLineId::new(),
        line_number,
        account_id: AccountId::new(),
        debit,
        credit,
        base_debit: debit,
        base_credit: credit,
        description: None,
        cost_center_id: None,
    }
}

/// Balanced line sets: each debit amount has a matching credit line.
fn arb_balanced_lines() -> impl Strategy<Value = Vec<JournalLine>> {
    prop::collection::vec(arb_amount(), 1..4).prop_map(|amounts| {
        let mut lines = Vec::new();
        for amount in amounts {
            let n = i32::try_from(lines.len()).unwrap_or(i32::MAX);
            lines.push(line(n + 1, amount, Decimal::ZERO));
            lines.push(line(n + 2, Decimal::ZERO, amount));
        }
        lines
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The reversing entry mirrors the original: same accounts and order,
    /// every signed amount negated, same totals, and both entries linked.
    #[test]
    fn prop_reversal_negates_original(lines in arb_balanced_lines()) {
        let company = CompanyId::new();
        let fy = FiscalYear {
            id: FiscalYearId::new(),
            company_id: company,
            name: "FY2024".into(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
        };
        let period = AccountingPeriod {
            id: AccountingPeriodId::new(),
            fiscal_year_id: fy.id,
            period_number: 1,
            name: "FY2024".into(),
            start_date: fy.start_date,
            end_date: fy.end_date,
            status: PeriodStatus::Open,
        };
        let calendar = FiscalCalendar::new(vec![fy.clone()], vec![period.clone()]);
        let base = usd();
        let numbering = SequentialNumbering::new("JE");
        let auth = GrantedCapabilities::all(UserId::new());
        let ctx = PostingContext {
            calendar: &calendar,
            base_currency: &base,
            numbering: &numbering,
            authorizer: &auth,
            now: Utc::now(),
        };

        let totals = JournalTotals::of(&lines);
        let entry = JournalEntry {
            id: JournalEntryId::new(),
            entry_number: "JE-000100".into(),
            company_id: company,
            fiscal_year_id: fy.id,
            accounting_period_id: period.id,
            entry_type: JournalEntryType::Manual,
            entry_date: date(2024, 2, 1),
            currency: usd(),
            exchange_rate: Decimal::ONE,
            description: "Accrual".into(),
            reference: JournalReference {
                reference_type: ReferenceType::JournalEntry,
                reference_id: Uuid::now_v7(),
                reference_number: "JE-000099".into(),
            },
            total_debit: totals.debit,
            total_credit: totals.credit,
            status: JournalStatus::Posted,
            posted_by: None,
            posted_at: None,
            reversal_of: None,
            reversal_entry_id: None,
            lines,
        };

        let out = ReversalService::reverse(
            ReversalRequest { entry: &entry, reversal_date: date(2024, 3, 1), reason: "accrual reversed" },
            ctx,
        ).unwrap();
        let rev = &out.reversing_entry;

        prop_assert_eq!(rev.lines.len(), entry.lines.len());
        for (orig, reversed) in entry.lines.iter().zip(&rev.lines) {
            prop_assert_eq!(reversed.account_id, orig.account_id);
            prop_assert_eq!(reversed.line_number, orig.line_number);
            prop_assert_eq!(reversed.signed_amount(), -orig.signed_amount());
            prop_assert_eq!(reversed.base_debit, orig.base_credit);
        }
        prop_assert_eq!(rev.total_debit, entry.total_credit);
        prop_assert!(rev.totals().is_balanced());
        prop_assert_eq!(rev.reversal_of, Some(entry.id));
        prop_assert_eq!(out.original.reversal_entry_id, Some(rev.id));
    }
}
