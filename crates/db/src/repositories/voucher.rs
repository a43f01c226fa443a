//! Payment voucher holds and lifecycle.

use chrono::Utc;
use folio_core::FinanceError;
use folio_core::collab::Authorizer;
use folio_core::document::{PaymentVoucher, StatusNote, VoucherWorkflow};
use folio_core::hold::HoldGate;
use folio_shared::types::{CurrencyCode, PaymentVoucherId, UserId};
use sea_orm::{ActiveModelTrait, DatabaseConnection, TransactionTrait};

use super::convert::{self, db_err};
use super::document::{append_history, load_payment_voucher, voucher_base_amount};

/// Payment voucher repository.
#[derive(Debug, Clone)]
pub struct VoucherRepository {
    db: DatabaseConnection,
    base_currency: CurrencyCode,
}

impl VoucherRepository {
    /// Creates a new voucher repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, base_currency: CurrencyCode) -> Self {
        Self { db, base_currency }
    }

    /// Places a hold on a voucher.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the voucher does not exist
    /// - any error of [`HoldGate::place_hold`]
    pub async fn place_hold(
        &self,
        voucher_id: PaymentVoucherId,
        reason: &str,
        authorizer: &dyn Authorizer,
    ) -> Result<PaymentVoucher, FinanceError> {
        let at = Utc::now();
        self.apply(voucher_id, "hold placed", |pv| {
            HoldGate::place_hold(pv, reason, authorizer, at).map(|c| (c.note, c.actor))
        })
        .await
    }

    /// Removes the hold from a voucher.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the voucher does not exist
    /// - any error of [`HoldGate::remove_hold`]
    pub async fn remove_hold(
        &self,
        voucher_id: PaymentVoucherId,
        note: Option<&str>,
        authorizer: &dyn Authorizer,
    ) -> Result<PaymentVoucher, FinanceError> {
        self.apply(voucher_id, "hold removed", |pv| {
            HoldGate::remove_hold(pv, note, authorizer).map(|c| (c.note, c.actor))
        })
        .await
    }

    /// Submits a draft voucher.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Unauthorized` or `InvalidState`.
    pub async fn submit(
        &self,
        voucher_id: PaymentVoucherId,
        note: Option<String>,
        authorizer: &dyn Authorizer,
    ) -> Result<PaymentVoucher, FinanceError> {
        self.apply(voucher_id, "voucher submitted", |pv| {
            VoucherWorkflow::submit(pv, authorizer, note).map(|c| (c.note, c.actor))
        })
        .await
    }

    /// Approves a submitted voucher.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Unauthorized`, `VoucherOnHold` or `InvalidState`.
    pub async fn approve(
        &self,
        voucher_id: PaymentVoucherId,
        note: Option<String>,
        authorizer: &dyn Authorizer,
    ) -> Result<PaymentVoucher, FinanceError> {
        self.apply(voucher_id, "voucher approved", |pv| {
            VoucherWorkflow::approve(pv, authorizer, note).map(|c| (c.note, c.actor))
        })
        .await
    }

    /// Marks an approved voucher as paid.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Unauthorized`, `VoucherOnHold` or `InvalidState`.
    pub async fn mark_paid(
        &self,
        voucher_id: PaymentVoucherId,
        note: Option<String>,
        authorizer: &dyn Authorizer,
    ) -> Result<PaymentVoucher, FinanceError> {
        self.apply(voucher_id, "voucher paid", |pv| {
            VoucherWorkflow::mark_paid(pv, authorizer, note).map(|c| (c.note, c.actor))
        })
        .await
    }

    /// Cancels an unpaid voucher.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Unauthorized` or `InvalidState`.
    pub async fn cancel(
        &self,
        voucher_id: PaymentVoucherId,
        note: Option<String>,
        authorizer: &dyn Authorizer,
    ) -> Result<PaymentVoucher, FinanceError> {
        self.apply(voucher_id, "voucher cancelled", |pv| {
            VoucherWorkflow::cancel(pv, authorizer, note).map(|c| (c.note, c.actor))
        })
        .await
    }

    /// Voids a paid voucher.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Unauthorized`, `BlankReason` or `InvalidState`.
    pub async fn void(
        &self,
        voucher_id: PaymentVoucherId,
        reason: &str,
        authorizer: &dyn Authorizer,
    ) -> Result<PaymentVoucher, FinanceError> {
        self.apply(voucher_id, "voucher voided", |pv| {
            VoucherWorkflow::void(pv, authorizer, reason).map(|c| (c.note, c.actor))
        })
        .await
    }

    /// Locks the voucher, applies `change` and stores the result with its
    /// history row.
    async fn apply<F>(
        &self,
        voucher_id: PaymentVoucherId,
        action: &'static str,
        change: F,
    ) -> Result<PaymentVoucher, FinanceError>
    where
        F: FnOnce(&mut PaymentVoucher) -> Result<(StatusNote, UserId), FinanceError>,
    {
        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now();

        let mut voucher = load_payment_voucher(&txn, voucher_id.into_inner(), true)
            .await?
            .ok_or_else(|| FinanceError::NotFound(format!("payment voucher {voucher_id}")))?;

        let (note, actor) = change(&mut voucher).inspect_err(|err| {
            tracing::warn!(
                voucher = %voucher_id,
                action,
                error_code = err.error_code(),
                error = %err,
                "voucher change rejected"
            );
        })?;

        let base_amount = voucher_base_amount(&voucher, &self.base_currency);
        convert::payment_voucher_update(&voucher, Some(base_amount), now)
            .update(&txn)
            .await
            .map_err(db_err)?;
        append_history(&txn, std::slice::from_ref(&note), actor, now).await?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            voucher = %voucher.voucher_number,
            status = %voucher.status,
            on_hold = voucher.hold.is_on_hold,
            actor = %actor,
            "{action}"
        );
        Ok(voucher)
    }
}
