//! Property-based tests for PayableLedgerRecorder.

use chrono::{NaiveDate, Utc};
use folio_shared::types::{CompanyId, CurrencyCode, SupplierId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::payable::{PayableEntry, PayableLedgerRecorder, PayableLedgerRow, PayableTransactionType};

/// A movement: day of January 2024, and a signed amount in cents.
fn arb_movement() -> impl Strategy<Value = (u32, i64)> {
    (1u32..29, prop_oneof![-1_000_000i64..-1, 1i64..1_000_000])
}

fn entry(company: CompanyId, supplier: SupplierId, day: u32, cents: i64) -> PayableEntry {
    let amount = Decimal::new(cents.abs(), 2);
    let (debit, credit, transaction_type) = if cents > 0 {
        (amount, Decimal::ZERO, PayableTransactionType::Payment)
    } else {
        (Decimal::ZERO, amount, PayableTransactionType::Invoice)
    };
    PayableEntry {
        company_id: company,
        supplier_id: supplier,
        transaction_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        transaction_type,
        reference: None,
        currency: CurrencyCode::parse("USD").unwrap(),
        debit,
        credit,
        base_debit: None,
        base_credit: None,
        description: String::new(),
    }
}

fn record_all(
    recorder: PayableLedgerRecorder<'_>,
    entries: impl IntoIterator<Item = PayableEntry>,
) -> Vec<PayableLedgerRow> {
    let mut rows = Vec::new();
    for e in entries {
        let row = recorder.record(e, &rows, Utc::now()).unwrap();
        rows.push(row);
    }
    rows
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Each row's balance is its own net effect plus the net of the rows
    /// already recorded that are dated strictly earlier.
    #[test]
    fn prop_balance_counts_strictly_earlier_rows(
        movements in prop::collection::vec(arb_movement(), 1..12),
    ) {
        let usd = CurrencyCode::parse("USD").unwrap();
        let recorder = PayableLedgerRecorder::new(&usd, &[]);
        let company = CompanyId::new();
        let supplier = SupplierId::new();

        let rows = record_all(
            recorder,
            movements.iter().map(|(d, c)| entry(company, supplier, *d, *c)),
        );

        for (i, (day, cents)) in movements.iter().enumerate() {
            let earlier: i64 = movements[..i]
                .iter()
                .filter(|(d, _)| d < day)
                .map(|(_, c)| *c)
                .sum();
            prop_assert_eq!(rows[i].balance_base, Decimal::new(earlier + cents, 2));
        }
    }

    /// The order of the existing rows does not change the computed balance.
    #[test]
    fn prop_balance_ignores_row_order(
        movements in prop::collection::vec(arb_movement(), 1..12),
        next in arb_movement(),
    ) {
        let usd = CurrencyCode::parse("USD").unwrap();
        let recorder = PayableLedgerRecorder::new(&usd, &[]);
        let company = CompanyId::new();
        let supplier = SupplierId::new();

        let mut rows = record_all(
            recorder,
            movements.iter().map(|(d, c)| entry(company, supplier, *d, *c)),
        );
        let forward = recorder
            .record(entry(company, supplier, next.0, next.1), &rows, Utc::now())
            .unwrap();
        rows.reverse();
        let backward = recorder
            .record(entry(company, supplier, next.0, next.1), &rows, Utc::now())
            .unwrap();

        prop_assert_eq!(forward.balance_base, backward.balance_base);
        prop_assert_eq!(forward.balance_foreign, backward.balance_foreign);
    }
}
