//! Manual and automatic payment allocation.
//!
//! A batch is all-or-nothing: every request is validated against the
//! running state of the batch before anything is returned, and the first
//! violation aborts the whole batch.

use chrono::{DateTime, Utc};
use folio_shared::types::{AllocationId, Money};
use rust_decimal::Decimal;

use super::types::{AllocationOutcome, AllocationRequest, PaymentAllocation};
use crate::collab::{Authorizer, Capability};
use crate::document::{DocumentStatus, PaymentVoucher, Statusable, SupplierInvoice};
use crate::error::FinanceError;
use crate::hold::HoldGate;
use crate::payable::{PayableEntry, PayableTransactionType};

/// Stateless allocation engine.
pub struct AllocationService;

impl AllocationService {
    /// Allocates explicit amounts to invoices, in request order.
    ///
    /// `existing` holds the voucher's allocations made so far; `invoices`
    /// holds every invoice a request may name, loaded and locked by the
    /// caller. Requests with zero or negative amounts are skipped.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` without `Capability::AllocatePayment`
    /// - `VoucherOnHold` if the voucher is held
    /// - `InvalidState` if the voucher is not submitted or approved, or a
    ///   target invoice cannot take payments
    /// - `AllocationExceedsUnallocated` if the batch exceeds the voucher's
    ///   unallocated amount
    /// - `NotFound` for an invoice id missing from `invoices`
    /// - `InvalidAllocationTarget` for an invoice of another supplier or company
    /// - `AllocationExceedsOutstanding` if a request exceeds the invoice's
    ///   outstanding amount at that point in the batch
    pub fn allocate(
        voucher: &PaymentVoucher,
        existing: &[PaymentAllocation],
        invoices: &[SupplierInvoice],
        requests: &[AllocationRequest],
        authorizer: &dyn Authorizer,
        now: DateTime<Utc>,
    ) -> Result<AllocationOutcome, FinanceError> {
        let allocated_by = authorizer.authorize(Capability::AllocatePayment)?;
        HoldGate::ensure_not_held(voucher)?;
        if !matches!(
            voucher.status,
            DocumentStatus::Submitted | DocumentStatus::Approved
        ) {
            return Err(FinanceError::invalid_state(
                &voucher.document_ref(),
                voucher.status,
                "submitted or approved",
            ));
        }

        let requests: Vec<AllocationRequest> = requests
            .iter()
            .map(|r| AllocationRequest::new(r.invoice_id, Money::round(r.amount)))
            .filter(|r| Money::is_positive(r.amount))
            .collect();

        let previously_allocated = Self::allocated_so_far(voucher, existing);
        let unallocated = Money::sub(voucher.amount, previously_allocated);
        let requested = Money::sum(requests.iter().map(|r| r.amount));
        if requested > unallocated {
            return Err(FinanceError::AllocationExceedsUnallocated {
                requested,
                unallocated,
            });
        }

        let mut touched: Vec<SupplierInvoice> = Vec::new();
        let mut allocations = Vec::with_capacity(requests.len());
        let mut payable_entries = Vec::with_capacity(requests.len());
        let mut status_notes = Vec::new();

        for request in &requests {
            let index = match touched.iter().position(|inv| inv.id == request.invoice_id) {
                Some(index) => index,
                None => {
                    let invoice = invoices
                        .iter()
                        .find(|inv| inv.id == request.invoice_id)
                        .ok_or_else(|| {
                            FinanceError::NotFound(format!(
                                "supplier invoice {}",
                                request.invoice_id
                            ))
                        })?;
                    Self::check_target(voucher, invoice)?;
                    touched.push(invoice.clone());
                    touched.len() - 1
                }
            };
            let invoice = &mut touched[index];

            if !invoice.accepts_settlement() {
                return Err(FinanceError::invalid_state(
                    &invoice.document_ref(),
                    invoice.status,
                    "approved or partially_paid with an outstanding amount",
                ));
            }
            if request.amount > invoice.outstanding_amount {
                return Err(FinanceError::AllocationExceedsOutstanding {
                    invoice_id: invoice.id,
                    requested: request.amount,
                    outstanding: invoice.outstanding_amount,
                });
            }

            let note = format!(
                "Payment {} allocated {}",
                voucher.voucher_number, request.amount
            );
            status_notes.extend(invoice.apply_settlement(request.amount, &note)?);

            allocations.push(PaymentAllocation {
                id: AllocationId::new(),
                payment_voucher_id: voucher.id,
                supplier_invoice_id: invoice.id,
                amount: request.amount,
                created_by: allocated_by,
                created_at: now,
            });
            payable_entries.push(PayableEntry {
                company_id: voucher.company_id,
                supplier_id: voucher.supplier_id,
                transaction_date: voucher.payment_date,
                transaction_type: PayableTransactionType::Payment,
                reference: Some(voucher.document_ref()),
                currency: voucher.currency.clone(),
                debit: request.amount,
                credit: Decimal::ZERO,
                base_debit: None,
                base_credit: None,
                description: format!(
                    "Payment {} to {}",
                    voucher.voucher_number, invoice.invoice_number
                ),
            });
        }

        let mut voucher = voucher.clone();
        voucher.set_allocated(Money::add(previously_allocated, requested));

        Ok(AllocationOutcome {
            allocations,
            invoices: touched,
            voucher,
            payable_entries,
            status_notes,
            allocated_by,
        })
    }

    /// Allocates the voucher's unallocated amount to the supplier's open
    /// invoices, oldest first.
    ///
    /// Invoices are ordered by `(invoice_date, invoice_number)` and each
    /// receives `min(remaining, outstanding)` until the payment or the
    /// invoices run out. Nothing to allocate yields an empty outcome.
    ///
    /// # Errors
    ///
    /// Same as [`AllocationService::allocate`].
    pub fn allocate_automatic(
        voucher: &PaymentVoucher,
        existing: &[PaymentAllocation],
        invoices: &[SupplierInvoice],
        authorizer: &dyn Authorizer,
        now: DateTime<Utc>,
    ) -> Result<AllocationOutcome, FinanceError> {
        let requests = Self::plan_fifo(voucher, existing, invoices);
        Self::allocate(voucher, existing, invoices, &requests, authorizer, now)
    }

    /// Oldest-first requests covering as much of the unallocated amount as
    /// the open invoices allow.
    #[must_use]
    pub fn plan_fifo(
        voucher: &PaymentVoucher,
        existing: &[PaymentAllocation],
        invoices: &[SupplierInvoice],
    ) -> Vec<AllocationRequest> {
        let mut remaining = Money::sub(
            voucher.amount,
            Self::allocated_so_far(voucher, existing),
        );

        let mut open: Vec<&SupplierInvoice> = invoices
            .iter()
            .filter(|inv| {
                inv.supplier_id == voucher.supplier_id
                    && inv.company_id == voucher.company_id
                    && inv.accepts_settlement()
            })
            .collect();
        open.sort_by(|a, b| {
            a.invoice_date
                .cmp(&b.invoice_date)
                .then_with(|| a.invoice_number.cmp(&b.invoice_number))
        });

        let mut requests = Vec::new();
        for invoice in open {
            if !Money::is_positive(remaining) {
                break;
            }
            let amount = remaining.min(invoice.outstanding_amount);
            requests.push(AllocationRequest::new(invoice.id, amount));
            remaining = Money::sub(remaining, amount);
        }
        requests
    }

    fn allocated_so_far(voucher: &PaymentVoucher, existing: &[PaymentAllocation]) -> Decimal {
        Money::sum(
            existing
                .iter()
                .filter(|a| a.payment_voucher_id == voucher.id)
                .map(|a| a.amount),
        )
    }

    fn check_target(voucher: &PaymentVoucher, invoice: &SupplierInvoice) -> Result<(), FinanceError> {
        if invoice.supplier_id != voucher.supplier_id {
            return Err(FinanceError::InvalidAllocationTarget {
                invoice_id: invoice.id,
                reason: format!("belongs to a different supplier than {}", voucher.voucher_number),
            });
        }
        if invoice.company_id != voucher.company_id {
            return Err(FinanceError::InvalidAllocationTarget {
                invoice_id: invoice.id,
                reason: format!("belongs to a different company than {}", voucher.voucher_number),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::GrantedCapabilities;
    use crate::document::types::fixtures::{date, payment_voucher, supplier_invoice};
    use crate::error::ErrorKind;
    use folio_shared::types::{CompanyId, SupplierId, SupplierInvoiceId, UserId};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    struct Setup {
        company: CompanyId,
        supplier: SupplierId,
        auth: GrantedCapabilities,
    }

    impl Setup {
        fn new() -> Self {
            Self {
                company: CompanyId::new(),
                supplier: SupplierId::new(),
                auth: GrantedCapabilities::all(UserId::new()),
            }
        }

        fn voucher(&self, amount: Decimal) -> PaymentVoucher {
            payment_voucher(self.company, self.supplier, amount)
        }

        fn invoice(&self, number: &str, on: (i32, u32, u32), total: Decimal) -> SupplierInvoice {
            supplier_invoice(
                self.company,
                self.supplier,
                number,
                date(on.0, on.1, on.2),
                total,
            )
        }
    }

    #[test]
    fn test_fifo_allocation() {
        let s = Setup::new();
        let pv = s.voucher(dec!(3000));
        // Deliberately out of date order.
        let invoices = vec![
            s.invoice("SI-3", (2024, 3, 1), dec!(2000)),
            s.invoice("SI-1", (2024, 1, 1), dec!(1500)),
            s.invoice("SI-2", (2024, 2, 1), dec!(1000)),
        ];

        let out =
            AllocationService::allocate_automatic(&pv, &[], &invoices, &s.auth, Utc::now())
                .unwrap();

        let amounts: Vec<_> = out.allocations.iter().map(|a| a.amount).collect();
        assert_eq!(amounts, vec![dec!(1500), dec!(1000), dec!(500)]);

        let numbers: Vec<_> = out.invoices.iter().map(|i| i.invoice_number.as_str()).collect();
        assert_eq!(numbers, vec!["SI-1", "SI-2", "SI-3"]);
        assert_eq!(out.invoices[0].status, DocumentStatus::Paid);
        assert_eq!(out.invoices[1].status, DocumentStatus::Paid);
        assert_eq!(out.invoices[2].status, DocumentStatus::PartiallyPaid);
        assert_eq!(out.invoices[2].outstanding_amount, dec!(1500));
        assert_eq!(out.invoices[2].paid_amount, dec!(500));

        assert_eq!(out.voucher.allocated_amount, dec!(3000));
        assert_eq!(out.voucher.unallocated_amount, dec!(0));
        assert_eq!(out.status_notes.len(), 3);
        assert_eq!(out.payable_entries.len(), 3);
        assert!(
            out.payable_entries
                .iter()
                .all(|e| e.transaction_type == PayableTransactionType::Payment)
        );
    }

    #[test]
    fn test_fifo_breaks_date_ties_by_number() {
        let s = Setup::new();
        let pv = s.voucher(dec!(100));
        let invoices = vec![
            s.invoice("SI-B", (2024, 1, 1), dec!(100)),
            s.invoice("SI-A", (2024, 1, 1), dec!(100)),
        ];
        let requests = AllocationService::plan_fifo(&pv, &[], &invoices);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].invoice_id, invoices[1].id);
    }

    #[test]
    fn test_fifo_skips_other_suppliers_and_settled_invoices() {
        let s = Setup::new();
        let pv = s.voucher(dec!(1000));
        let mut settled = s.invoice("SI-1", (2024, 1, 1), dec!(300));
        settled.paid_amount = dec!(300);
        settled.outstanding_amount = dec!(0);
        settled.status = DocumentStatus::Paid;
        let foreign = supplier_invoice(
            s.company,
            SupplierId::new(),
            "X-1",
            date(2024, 1, 1),
            dec!(300),
        );
        let mut draft = s.invoice("SI-2", (2024, 1, 2), dec!(300));
        draft.status = DocumentStatus::Draft;
        let open = s.invoice("SI-3", (2024, 1, 3), dec!(300));

        let requests =
            AllocationService::plan_fifo(&pv, &[], &[settled, foreign, draft, open.clone()]);
        assert_eq!(requests, vec![AllocationRequest::new(open.id, dec!(300))]);
    }

    #[test]
    fn test_automatic_with_nothing_to_do() {
        let s = Setup::new();
        let pv = s.voucher(dec!(500));
        let out = AllocationService::allocate_automatic(&pv, &[], &[], &s.auth, Utc::now())
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(out.voucher.unallocated_amount, dec!(500));
    }

    #[test]
    fn test_manual_allocation_skips_non_positive_amounts() {
        let s = Setup::new();
        let pv = s.voucher(dec!(1000));
        let a = s.invoice("SI-1", (2024, 1, 1), dec!(600));
        let b = s.invoice("SI-2", (2024, 1, 2), dec!(600));
        let requests = [
            AllocationRequest::new(a.id, dec!(400)),
            AllocationRequest::new(b.id, dec!(0)),
            AllocationRequest::new(SupplierInvoiceId::new(), dec!(-5)),
        ];

        let out = AllocationService::allocate(
            &pv,
            &[],
            &[a.clone(), b],
            &requests,
            &s.auth,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(out.allocations.len(), 1);
        assert_eq!(out.invoices.len(), 1);
        assert_eq!(out.invoices[0].id, a.id);
        assert_eq!(out.invoices[0].outstanding_amount, dec!(200));
        assert_eq!(out.invoices[0].status, DocumentStatus::PartiallyPaid);
        assert_eq!(out.voucher.allocated_amount, dec!(400));
        assert_eq!(out.voucher.unallocated_amount, dec!(600));
    }

    #[test]
    fn test_voucher_totals_include_earlier_allocations() {
        let s = Setup::new();
        let pv = s.voucher(dec!(1000));
        let inv = s.invoice("SI-1", (2024, 1, 1), dec!(2000));
        let earlier = PaymentAllocation {
            id: AllocationId::new(),
            payment_voucher_id: pv.id,
            supplier_invoice_id: SupplierInvoiceId::new(),
            amount: dec!(700),
            created_by: UserId::new(),
            created_at: Utc::now(),
        };

        let err = AllocationService::allocate(
            &pv,
            std::slice::from_ref(&earlier),
            std::slice::from_ref(&inv),
            &[AllocationRequest::new(inv.id, dec!(400))],
            &s.auth,
            Utc::now(),
        )
        .unwrap_err();
        match err {
            FinanceError::AllocationExceedsUnallocated {
                requested,
                unallocated,
            } => {
                assert_eq!(requested, dec!(400));
                assert_eq!(unallocated, dec!(300));
            }
            other => panic!("expected AllocationExceedsUnallocated, got {other:?}"),
        }

        let out = AllocationService::allocate(
            &pv,
            &[earlier],
            &[inv.clone()],
            &[AllocationRequest::new(inv.id, dec!(300))],
            &s.auth,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(out.voucher.allocated_amount, dec!(1000));
        assert_eq!(out.voucher.unallocated_amount, dec!(0));
    }

    #[test]
    fn test_repeated_invoice_uses_running_outstanding() {
        let s = Setup::new();
        let pv = s.voucher(dec!(1000));
        let inv = s.invoice("SI-1", (2024, 1, 1), dec!(500));

        let out = AllocationService::allocate(
            &pv,
            &[],
            std::slice::from_ref(&inv),
            &[
                AllocationRequest::new(inv.id, dec!(200)),
                AllocationRequest::new(inv.id, dec!(300)),
            ],
            &s.auth,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(out.invoices.len(), 1);
        assert_eq!(out.invoices[0].status, DocumentStatus::Paid);
        let transitions: Vec<_> = out.status_notes.iter().map(|n| n.to).collect();
        assert_eq!(
            transitions,
            vec![DocumentStatus::PartiallyPaid, DocumentStatus::Paid]
        );

        let err = AllocationService::allocate(
            &pv,
            &[],
            std::slice::from_ref(&inv),
            &[
                AllocationRequest::new(inv.id, dec!(300)),
                AllocationRequest::new(inv.id, dec!(300)),
            ],
            &s.auth,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FinanceError::AllocationExceedsOutstanding { outstanding, .. } if outstanding == dec!(200)
        ));

        // Once settled inside the batch, the invoice takes no more payments.
        let err = AllocationService::allocate(
            &pv,
            &[],
            std::slice::from_ref(&inv),
            &[
                AllocationRequest::new(inv.id, dec!(500)),
                AllocationRequest::new(inv.id, dec!(100)),
            ],
            &s.auth,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_amount_over_outstanding_is_rejected() {
        let s = Setup::new();
        let pv = s.voucher(dec!(1000));
        let inv = s.invoice("SI-1", (2024, 1, 1), dec!(500));
        let err = AllocationService::allocate(
            &pv,
            &[],
            std::slice::from_ref(&inv),
            &[AllocationRequest::new(inv.id, dec!(500.0001))],
            &s.auth,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FinanceError::AllocationExceedsOutstanding { .. }
        ));
    }

    #[test]
    fn test_held_voucher_cannot_allocate() {
        let s = Setup::new();
        let mut pv = s.voucher(dec!(1000));
        HoldGate::place_hold(&mut pv, "bank details disputed", &s.auth, Utc::now()).unwrap();
        let invoices = vec![s.invoice("SI-1", (2024, 1, 1), dec!(500))];

        let err = AllocationService::allocate_automatic(&pv, &[], &invoices, &s.auth, Utc::now())
            .unwrap_err();
        assert!(matches!(err, FinanceError::VoucherOnHold { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[rstest]
    #[case(DocumentStatus::Draft)]
    #[case(DocumentStatus::Paid)]
    #[case(DocumentStatus::Cancelled)]
    #[case(DocumentStatus::Voided)]
    fn test_voucher_status_gate(#[case] status: DocumentStatus) {
        let s = Setup::new();
        let mut pv = s.voucher(dec!(100));
        pv.status = status;
        let inv = s.invoice("SI-1", (2024, 1, 1), dec!(100));
        let err = AllocationService::allocate(
            &pv,
            &[],
            std::slice::from_ref(&inv),
            &[AllocationRequest::new(inv.id, dec!(100))],
            &s.auth,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_target_checks() {
        let s = Setup::new();
        let pv = s.voucher(dec!(1000));

        let other_supplier =
            supplier_invoice(s.company, SupplierId::new(), "X-1", date(2024, 1, 1), dec!(100));
        let other_company =
            supplier_invoice(CompanyId::new(), s.supplier, "X-2", date(2024, 1, 1), dec!(100));
        for inv in [other_supplier, other_company] {
            let err = AllocationService::allocate(
                &pv,
                &[],
                std::slice::from_ref(&inv),
                &[AllocationRequest::new(inv.id, dec!(50))],
                &s.auth,
                Utc::now(),
            )
            .unwrap_err();
            assert!(matches!(err, FinanceError::InvalidAllocationTarget { .. }));
        }

        let err = AllocationService::allocate(
            &pv,
            &[],
            &[],
            &[AllocationRequest::new(SupplierInvoiceId::new(), dec!(50))],
            &s.auth,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, FinanceError::NotFound(_)));
    }

    #[test]
    fn test_allocation_requires_capability() {
        let s = Setup::new();
        let pv = s.voucher(dec!(100));
        let auth = GrantedCapabilities::new(UserId::new(), [Capability::PostToLedger]);
        let err = AllocationService::allocate_automatic(&pv, &[], &[], &auth, Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            FinanceError::Unauthorized(Capability::AllocatePayment)
        ));
    }
}
