//! Property-based tests for PostingService.

use chrono::Utc;
use folio_shared::types::{
    AccountId, AccountingPeriodId, CompanyId, CurrencyCode, FiscalYearId, SupplierId, UserId,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::collab::{GrantedCapabilities, SequentialNumbering};
use crate::document::types::fixtures::{date, line, supplier_invoice, usd};
use crate::document::{DocumentStatus, SourceDocument};
use crate::error::FinanceError;
use crate::fiscal::{AccountingPeriod, FiscalCalendar, FiscalYear, PeriodStatus};
use crate::journal::mapping::{AccountMapping, InvoiceAccounts};
use crate::journal::posting::{PostingContext, PostingRequest, PostingService};

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_rate() -> impl Strategy<Value = Decimal> {
    (5_000i64..20_000i64).prop_map(|n| Decimal::new(n, 4))
}

fn open_calendar(company: CompanyId) -> FiscalCalendar {
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
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        status: PeriodStatus::Open,
    };
    FiscalCalendar::new(vec![fy], vec![period])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any approved supplier invoice whose total is lines + tax - discount
    /// posts to an entry that balances in entry and base currency. Debits
    /// carry lines and tax, the discount is a credit, and the payable credit
    /// equals the invoice total.
    #[test]
    fn prop_posted_invoice_is_balanced(
        line_amounts in prop::collection::vec(arb_amount(), 1..6),
        tax in prop_oneof![Just(Decimal::ZERO), arb_amount()],
        recoverable in any::<bool>(),
        discount_pct in 0u32..50,
        rate in arb_rate(),
        foreign in any::<bool>(),
    ) {
        let company = CompanyId::new();
        let calendar = open_calendar(company);
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

        let subtotal: Decimal = line_amounts.iter().sum();
        let discount = (subtotal * Decimal::from(discount_pct) / Decimal::ONE_HUNDRED).round_dp(2);
        let total = subtotal + tax - discount;

        let mut inv = supplier_invoice(company, SupplierId::new(), "SI-P", date(2024, 6, 1), total);
        inv.lines = line_amounts.iter().map(|a| line(AccountId::new(), *a)).collect();
        inv.subtotal = subtotal;
        inv.tax_amount = tax;
        inv.tax_recoverable = recoverable;
        inv.discount_amount = discount;
        if foreign {
            inv.currency = CurrencyCode::parse("EUR").unwrap();
            inv.exchange_rate = rate;
        }
        let payable = AccountId::new();
        let mapping = AccountMapping::SupplierInvoice(
            InvoiceAccounts::new(payable, Some(AccountId::new())).unwrap(),
        );
        let doc = SourceDocument::SupplierInvoice(inv);

        let out = PostingService::post(
            PostingRequest { document: &doc, mapping: &mapping, linked_invoice: None },
            ctx,
        ).unwrap();

        prop_assert!(out.entry.totals().is_balanced());
        prop_assert_eq!(out.entry.total_debit, subtotal + tax);
        prop_assert_eq!(out.entry.total_credit, total + discount);
        let payable_credit: Decimal = out
            .entry
            .lines
            .iter()
            .filter(|l| l.account_id == payable)
            .map(|l| l.credit)
            .sum();
        prop_assert_eq!(payable_credit, total);
        let expected_rate = if foreign { rate } else { Decimal::ONE };
        prop_assert_eq!(out.entry.exchange_rate, expected_rate);
        prop_assert_eq!(out.payable_entry.map(|p| p.credit), Some(total));
    }

    /// Posting the result of a successful posting fails with the id of the
    /// first entry, however many times it is retried.
    #[test]
    fn prop_posting_is_idempotent(total in arb_amount(), retries in 1usize..4) {
        let company = CompanyId::new();
        let calendar = open_calendar(company);
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
        let mapping = AccountMapping::SupplierInvoice(
            InvoiceAccounts::new(AccountId::new(), None).unwrap(),
        );
        let doc = SourceDocument::SupplierInvoice(
            supplier_invoice(company, SupplierId::new(), "SI-I", date(2024, 5, 1), total),
        );

        let first = PostingService::post(
            PostingRequest { document: &doc, mapping: &mapping, linked_invoice: None },
            ctx,
        ).unwrap();
        prop_assert_eq!(first.document.status(), DocumentStatus::Approved);
        let retry = PostingRequest { document: &first.document, mapping: &mapping, linked_invoice: None };
        for _ in 0..retries {
            match PostingService::post(retry, ctx) {
                Err(FinanceError::AlreadyPosted { journal_entry_id, .. }) => {
                    prop_assert_eq!(journal_entry_id, first.entry.id);
                }
                other => prop_assert!(false, "expected AlreadyPosted, got {:?}", other),
            }
        }
    }
}
