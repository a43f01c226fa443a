//! Property-based tests for AllocationService.

use chrono::Utc;
use folio_shared::types::{CompanyId, SupplierId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::allocation::service::AllocationService;
use crate::allocation::types::AllocationRequest;
use crate::collab::GrantedCapabilities;
use crate::document::types::fixtures::{date, payment_voucher, supplier_invoice};
use crate::document::{DocumentStatus, SupplierInvoice};

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn invoices(company: CompanyId, supplier: SupplierId, totals: &[(u32, Decimal)]) -> Vec<SupplierInvoice> {
    totals
        .iter()
        .enumerate()
        .map(|(i, (day, total))| {
            supplier_invoice(
                company,
                supplier,
                &format!("SI-{i:03}"),
                date(2024, 1, *day),
                *total,
            )
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Whatever a manual batch asks for, a successful batch never allocates
    /// more than the voucher amount, keeps `unallocated = amount - allocated`,
    /// and never pushes an invoice's outstanding amount below zero.
    #[test]
    fn prop_manual_allocation_bound(
        voucher_amount in arb_amount(),
        totals in prop::collection::vec((1u32..28, arb_amount()), 1..5),
        picks in prop::collection::vec((0usize..5, arb_amount()), 0..6),
    ) {
        let company = CompanyId::new();
        let supplier = SupplierId::new();
        let auth = GrantedCapabilities::all(UserId::new());
        let pv = payment_voucher(company, supplier, voucher_amount);
        let invoices = invoices(company, supplier, &totals);
        let requests: Vec<_> = picks
            .iter()
            .map(|(i, amount)| AllocationRequest::new(invoices[i % invoices.len()].id, *amount))
            .collect();

        if let Ok(out) = AllocationService::allocate(&pv, &[], &invoices, &requests, &auth, Utc::now()) {
            prop_assert!(out.total_allocated() <= pv.amount);
            prop_assert_eq!(out.voucher.allocated_amount, out.total_allocated());
            prop_assert_eq!(out.voucher.unallocated_amount, pv.amount - out.total_allocated());
            for inv in &out.invoices {
                prop_assert!(inv.outstanding_amount >= Decimal::ZERO);
                prop_assert_eq!(inv.outstanding_amount, inv.total_amount - inv.paid_amount);
            }
        }
    }

    /// Automatic allocation settles exactly `min(unallocated, open total)`,
    /// and every invoice except possibly the last one touched ends up paid.
    #[test]
    fn prop_fifo_allocates_greedily(
        voucher_amount in arb_amount(),
        totals in prop::collection::vec((1u32..28, arb_amount()), 0..6),
    ) {
        let company = CompanyId::new();
        let supplier = SupplierId::new();
        let auth = GrantedCapabilities::all(UserId::new());
        let pv = payment_voucher(company, supplier, voucher_amount);
        let invoices = invoices(company, supplier, &totals);
        let open_total: Decimal = invoices.iter().map(|i| i.outstanding_amount).sum();

        let out = AllocationService::allocate_automatic(&pv, &[], &invoices, &auth, Utc::now()).unwrap();

        prop_assert_eq!(out.total_allocated(), voucher_amount.min(open_total));
        prop_assert_eq!(out.voucher.unallocated_amount, voucher_amount - out.total_allocated());
        if let Some((_, settled)) = out.invoices.split_last() {
            for inv in settled {
                prop_assert_eq!(inv.status, DocumentStatus::Paid);
            }
        }
        for pair in out.invoices.windows(2) {
            prop_assert!(
                (pair[0].invoice_date, &pair[0].invoice_number)
                    <= (pair[1].invoice_date, &pair[1].invoice_number)
            );
        }
    }
}
