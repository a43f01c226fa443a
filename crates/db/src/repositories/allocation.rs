//! Transactional payment allocation.
//!
//! Lock order is the voucher first, then its target invoices in ascending
//! id order, so two batches touching the same invoices cannot deadlock.

use chrono::Utc;
use folio_core::FinanceError;
use folio_core::allocation::{
    AllocationOutcome, AllocationRequest, AllocationService, PaymentAllocation,
};
use folio_core::collab::Authorizer;
use folio_core::document::{PaymentVoucher, SupplierInvoice};
use folio_core::payable::PayableLedgerRow;
use folio_shared::types::{CurrencyCode, PaymentVoucherId, SupplierInvoiceId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use super::convert::{self, db_err};
use super::document::{append_history, load_payment_voucher, lock_supplier_invoices, voucher_base_amount};
use super::payable_ledger::record_entries;
use crate::entities::sea_orm_active_enums::DocumentStatus;
use crate::entities::{payment_voucher_allocations, supplier_invoices};

/// Result of a committed allocation batch.
#[derive(Debug, Clone)]
pub struct AllocationResult {
    /// Allocations created by the batch.
    pub allocations: Vec<PaymentAllocation>,
    /// Invoices as stored after the batch.
    pub invoices: Vec<SupplierInvoice>,
    /// Voucher as stored after the batch.
    pub voucher: PaymentVoucher,
    /// Payment rows written to the supplier's payable ledger.
    pub ledger_rows: Vec<PayableLedgerRow>,
}

impl AllocationResult {
    /// Sum of the allocations created by the batch.
    #[must_use]
    pub fn total_allocated(&self) -> Decimal {
        self.allocations.iter().map(|a| a.amount).sum()
    }
}

/// Payment allocation repository.
#[derive(Debug, Clone)]
pub struct AllocationRepository {
    db: DatabaseConnection,
    base_currency: CurrencyCode,
}

impl AllocationRepository {
    /// Creates a new allocation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, base_currency: CurrencyCode) -> Self {
        Self { db, base_currency }
    }

    /// Allocates explicit amounts of a voucher to invoices.
    ///
    /// The batch is all or nothing.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the voucher or a target invoice does not exist
    /// - any error of [`AllocationService::allocate`]
    pub async fn allocate(
        &self,
        voucher_id: PaymentVoucherId,
        requests: &[AllocationRequest],
        authorizer: &dyn Authorizer,
    ) -> Result<AllocationResult, FinanceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now();

        let voucher = lock_voucher(&txn, voucher_id).await?;
        let existing = load_allocations(&txn, voucher_id).await?;
        let invoices = lock_supplier_invoices(
            &txn,
            requests
                .iter()
                .map(|r| SupplierInvoiceId::into_inner(r.invoice_id))
                .collect(),
        )
        .await?;

        let outcome =
            AllocationService::allocate(&voucher, &existing, &invoices, requests, authorizer, now)
                .inspect_err(|err| log_rejection(&voucher, err))?;

        self.apply(txn, outcome).await
    }

    /// Allocates the voucher's unallocated amount to the supplier's open
    /// invoices, oldest first.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the voucher does not exist
    /// - any error of [`AllocationService::allocate_automatic`]
    pub async fn allocate_automatic(
        &self,
        voucher_id: PaymentVoucherId,
        authorizer: &dyn Authorizer,
    ) -> Result<AllocationResult, FinanceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now();

        let voucher = lock_voucher(&txn, voucher_id).await?;
        let existing = load_allocations(&txn, voucher_id).await?;
        let open_ids = open_invoice_ids(&txn, &voucher).await?;
        let invoices = lock_supplier_invoices(&txn, open_ids).await?;

        let outcome =
            AllocationService::allocate_automatic(&voucher, &existing, &invoices, authorizer, now)
                .inspect_err(|err| log_rejection(&voucher, err))?;

        self.apply(txn, outcome).await
    }

    /// Allocations of a voucher, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the query fails.
    pub async fn list_allocations(
        &self,
        voucher_id: PaymentVoucherId,
    ) -> Result<Vec<PaymentAllocation>, FinanceError> {
        load_allocations(&self.db, voucher_id).await
    }

    async fn apply(
        &self,
        txn: DatabaseTransaction,
        outcome: AllocationOutcome,
    ) -> Result<AllocationResult, FinanceError> {
        let now = Utc::now();

        for allocation in &outcome.allocations {
            convert::allocation_active(allocation)
                .insert(&txn)
                .await
                .map_err(db_err)?;
        }
        for invoice in &outcome.invoices {
            convert::supplier_invoice_update(invoice, now)
                .update(&txn)
                .await
                .map_err(db_err)?;
        }
        let base_amount = voucher_base_amount(&outcome.voucher, &self.base_currency);
        convert::payment_voucher_update(&outcome.voucher, Some(base_amount), now)
            .update(&txn)
            .await
            .map_err(db_err)?;
        append_history(&txn, &outcome.status_notes, outcome.allocated_by, now).await?;

        let ledger_rows =
            record_entries(&txn, &self.base_currency, outcome.payable_entries, now).await?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            voucher = %outcome.voucher.voucher_number,
            allocations = outcome.allocations.len(),
            total = %outcome.allocations.iter().map(|a| a.amount).sum::<Decimal>(),
            unallocated = %outcome.voucher.unallocated_amount,
            allocated_by = %outcome.allocated_by,
            "payment allocated"
        );

        Ok(AllocationResult {
            allocations: outcome.allocations,
            invoices: outcome.invoices,
            voucher: outcome.voucher,
            ledger_rows,
        })
    }
}

fn log_rejection(voucher: &PaymentVoucher, err: &FinanceError) {
    tracing::warn!(
        voucher = %voucher.voucher_number,
        error_code = err.error_code(),
        error = %err,
        "allocation rejected"
    );
}

async fn lock_voucher<C: ConnectionTrait>(
    conn: &C,
    voucher_id: PaymentVoucherId,
) -> Result<PaymentVoucher, FinanceError> {
    load_payment_voucher(conn, voucher_id.into_inner(), true)
        .await?
        .ok_or_else(|| FinanceError::NotFound(format!("payment voucher {voucher_id}")))
}

async fn load_allocations<C: ConnectionTrait>(
    conn: &C,
    voucher_id: PaymentVoucherId,
) -> Result<Vec<PaymentAllocation>, FinanceError> {
    Ok(payment_voucher_allocations::Entity::find()
        .filter(payment_voucher_allocations::Column::PaymentVoucherId.eq(voucher_id.into_inner()))
        .order_by_asc(payment_voucher_allocations::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(convert::allocation)
        .collect())
}

/// Ids of the supplier's invoices that can still take payments.
async fn open_invoice_ids<C: ConnectionTrait>(
    conn: &C,
    voucher: &PaymentVoucher,
) -> Result<Vec<Uuid>, FinanceError> {
    supplier_invoices::Entity::find()
        .select_only()
        .column(supplier_invoices::Column::Id)
        .filter(supplier_invoices::Column::CompanyId.eq(voucher.company_id.into_inner()))
        .filter(supplier_invoices::Column::SupplierId.eq(voucher.supplier_id.into_inner()))
        .filter(
            supplier_invoices::Column::Status
                .is_in([DocumentStatus::Approved, DocumentStatus::PartiallyPaid]),
        )
        .filter(supplier_invoices::Column::OutstandingAmount.gt(Decimal::ZERO))
        .into_tuple::<Uuid>()
        .all(conn)
        .await
        .map_err(db_err)
}
