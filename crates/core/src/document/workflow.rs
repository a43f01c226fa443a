//! Payment voucher approval workflow.
//!
//! Valid transitions:
//! - Draft → Submitted (submit)
//! - Submitted → Approved (approve, voucher must not be held)
//! - Approved → Paid (mark paid, voucher must not be held)
//! - Draft | Submitted | Approved → Cancelled (cancel)
//! - Paid → Voided (void, reason required)

use folio_shared::types::UserId;

use super::status::{DocumentStatus, StatusNote, Statusable};
use super::types::PaymentVoucher;
use crate::collab::{Authorizer, Capability};
use crate::error::FinanceError;
use crate::hold::HoldGate;

/// A completed workflow step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowChange {
    /// History note to persist.
    pub note: StatusNote,
    /// User who performed the step.
    pub actor: UserId,
}

/// Stateless workflow steps for payment vouchers.
pub struct VoucherWorkflow;

impl VoucherWorkflow {
    /// Submit a draft voucher for approval.
    pub fn submit(
        voucher: &mut PaymentVoucher,
        authorizer: &dyn Authorizer,
        note: Option<String>,
    ) -> Result<WorkflowChange, FinanceError> {
        Self::step(voucher, authorizer, DocumentStatus::Submitted, note)
    }

    /// Approve a submitted voucher.
    ///
    /// Fails with `VoucherOnHold` while a hold is in place.
    pub fn approve(
        voucher: &mut PaymentVoucher,
        authorizer: &dyn Authorizer,
        note: Option<String>,
    ) -> Result<WorkflowChange, FinanceError> {
        HoldGate::ensure_not_held(voucher)?;
        Self::step(voucher, authorizer, DocumentStatus::Approved, note)
    }

    /// Mark an approved voucher as paid.
    pub fn mark_paid(
        voucher: &mut PaymentVoucher,
        authorizer: &dyn Authorizer,
        note: Option<String>,
    ) -> Result<WorkflowChange, FinanceError> {
        HoldGate::ensure_not_held(voucher)?;
        Self::step(voucher, authorizer, DocumentStatus::Paid, note)
    }

    /// Cancel a voucher that has not been paid.
    pub fn cancel(
        voucher: &mut PaymentVoucher,
        authorizer: &dyn Authorizer,
        note: Option<String>,
    ) -> Result<WorkflowChange, FinanceError> {
        Self::step(voucher, authorizer, DocumentStatus::Cancelled, note)
    }

    /// Void a paid voucher.
    pub fn void(
        voucher: &mut PaymentVoucher,
        authorizer: &dyn Authorizer,
        reason: &str,
    ) -> Result<WorkflowChange, FinanceError> {
        if reason.trim().is_empty() {
            return Err(FinanceError::BlankReason);
        }
        Self::step(
            voucher,
            authorizer,
            DocumentStatus::Voided,
            Some(reason.trim().to_string()),
        )
    }

    fn step(
        voucher: &mut PaymentVoucher,
        authorizer: &dyn Authorizer,
        to: DocumentStatus,
        note: Option<String>,
    ) -> Result<WorkflowChange, FinanceError> {
        let actor = authorizer.authorize(Capability::ApprovePayment)?;
        let note = voucher.transition(to, note)?;
        Ok(WorkflowChange { note, actor })
    }
}
