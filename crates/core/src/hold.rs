//! Payment voucher hold gate.
//!
//! A held voucher cannot be allocated, approved, or paid. Placing and
//! removing a hold never changes the lifecycle status; each produces a
//! status history note with `from == to`.

use chrono::{DateTime, Utc};
use folio_shared::types::UserId;

use crate::collab::{Authorizer, Capability};
use crate::document::{DocumentStatus, HoldState, PaymentVoucher, StatusNote, Statusable};
use crate::error::FinanceError;

/// Result of placing or removing a hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldChange {
    /// History note to persist.
    pub note: StatusNote,
    /// User who changed the hold.
    pub actor: UserId,
}

/// Stateless hold operations on payment vouchers.
pub struct HoldGate;

impl HoldGate {
    /// Places a hold on the voucher.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` without `Capability::ManageHold`
    /// - `BlankReason` if `reason` is blank
    /// - `InvalidState` if the voucher is paid, voided, or already held
    pub fn place_hold(
        voucher: &mut PaymentVoucher,
        reason: &str,
        authorizer: &dyn Authorizer,
        at: DateTime<Utc>,
    ) -> Result<HoldChange, FinanceError> {
        let actor = authorizer.authorize(Capability::ManageHold)?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(FinanceError::BlankReason);
        }
        if matches!(voucher.status, DocumentStatus::Paid | DocumentStatus::Voided) {
            return Err(FinanceError::invalid_state(
                &voucher.document_ref(),
                voucher.status,
                "not paid or voided",
            ));
        }
        if voucher.hold.is_on_hold {
            return Err(FinanceError::invalid_state(
                &voucher.document_ref(),
                "on hold",
                "not on hold",
            ));
        }

        voucher.hold = HoldState {
            is_on_hold: true,
            hold_reason: Some(reason.to_string()),
            held_by: Some(actor),
            held_at: Some(at),
        };

        Ok(HoldChange {
            note: Self::note(voucher, format!("Hold placed: {reason}")),
            actor,
        })
    }

    /// Removes the hold from the voucher.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` without `Capability::ManageHold`
    /// - `InvalidState` if the voucher is not held
    pub fn remove_hold(
        voucher: &mut PaymentVoucher,
        note: Option<&str>,
        authorizer: &dyn Authorizer,
    ) -> Result<HoldChange, FinanceError> {
        let actor = authorizer.authorize(Capability::ManageHold)?;

        if !voucher.hold.is_on_hold {
            return Err(FinanceError::invalid_state(
                &voucher.document_ref(),
                "not on hold",
                "on hold",
            ));
        }

        voucher.hold = HoldState::default();

        let text = match note.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => format!("Hold removed: {n}"),
            None => "Hold removed".to_string(),
        };

        Ok(HoldChange {
            note: Self::note(voucher, text),
            actor,
        })
    }

    /// Fails if the voucher is held.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::VoucherOnHold`.
    pub fn ensure_not_held(voucher: &PaymentVoucher) -> Result<(), FinanceError> {
        if voucher.hold.is_on_hold {
            return Err(FinanceError::VoucherOnHold {
                voucher_id: voucher.id,
                reason: voucher.hold.hold_reason.clone().unwrap_or_default(),
            });
        }
        Ok(())
    }

    fn note(voucher: &PaymentVoucher, text: String) -> StatusNote {
        StatusNote {
            document: voucher.document_ref(),
            from: voucher.status,
            to: voucher.status,
            note: Some(text),
        }
    }
}
