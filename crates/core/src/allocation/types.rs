//! Allocation records and batch results.

use chrono::{DateTime, Utc};
use folio_shared::types::{AllocationId, PaymentVoucherId, SupplierInvoiceId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::document::{PaymentVoucher, StatusNote, SupplierInvoice};
use crate::payable::PayableEntry;

/// Part of a payment voucher applied to one supplier invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    /// Unique identifier.
    pub id: AllocationId,
    /// Paying voucher.
    pub payment_voucher_id: PaymentVoucherId,
    /// Settled invoice.
    pub supplier_invoice_id: SupplierInvoiceId,
    /// Allocated amount, always positive.
    pub amount: Decimal,
    /// User who allocated.
    pub created_by: UserId,
    /// When the allocation was made.
    pub created_at: DateTime<Utc>,
}

/// One `(invoice, amount)` pair of a manual allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Target invoice.
    pub invoice_id: SupplierInvoiceId,
    /// Amount to apply. Zero or negative amounts are skipped.
    pub amount: Decimal,
}

impl AllocationRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(invoice_id: SupplierInvoiceId, amount: Decimal) -> Self {
        Self { invoice_id, amount }
    }
}

/// Every write produced by an allocation batch.
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    /// New allocation records, in processing order.
    pub allocations: Vec<PaymentAllocation>,
    /// Touched invoices with amounts and status updated, in first-touch order.
    pub invoices: Vec<SupplierInvoice>,
    /// Voucher with `allocated_amount` and `unallocated_amount` recomputed
    /// over all of its allocations.
    pub voucher: PaymentVoucher,
    /// Supplier ledger movements, one per allocation.
    pub payable_entries: Vec<PayableEntry>,
    /// Invoice status changes to append to history.
    pub status_notes: Vec<StatusNote>,
    /// User who allocated.
    pub allocated_by: UserId,
}

impl AllocationOutcome {
    /// Returns true if the batch allocated nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Sum of the new allocations.
    #[must_use]
    pub fn total_allocated(&self) -> Decimal {
        self.allocations.iter().map(|a| a.amount).sum()
    }
}
