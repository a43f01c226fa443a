//! Document lifecycle statuses and the shared transition contract.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::FinanceError;

/// Source document kinds handled by the engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Bill received from a supplier.
    SupplierInvoice,
    /// Credit received from a supplier reducing what is owed.
    DebitNote,
    /// Outgoing payment to a supplier.
    PaymentVoucher,
    /// Bill issued to a customer.
    SalesInvoice,
}

impl DocumentKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SupplierInvoice => "supplier_invoice",
            Self::DebitNote => "debit_note",
            Self::PaymentVoucher => "payment_voucher",
            Self::SalesInvoice => "sales_invoice",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "supplier_invoice" => Some(Self::SupplierInvoice),
            "debit_note" => Some(Self::DebitNote),
            "payment_voucher" => Some(Self::PaymentVoucher),
            "sales_invoice" => Some(Self::SalesInvoice),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifies a document in errors and status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Document kind.
    pub kind: DocumentKind,
    /// Document id.
    pub id: Uuid,
    /// Human readable document number.
    pub number: String,
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.number)
    }
}

/// Lifecycle status shared by all source documents.
///
/// Not every document uses every status. Each document type decides its
/// own transition table through [`Statusable::allows_transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Being drafted and can be modified.
    Draft,
    /// Submitted for approval.
    Submitted,
    /// Approved, eligible for posting or allocation.
    Approved,
    /// Some but not all of the amount has been settled.
    PartiallyPaid,
    /// Fully settled.
    Paid,
    /// Cancelled before taking effect.
    Cancelled,
    /// Voided after taking effect.
    Voided,
}

impl DocumentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Voided => "voided",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "partially_paid" => Some(Self::PartiallyPaid),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            "voided" => Some(Self::Voided),
            _ => None,
        }
    }

    /// Returns true if no further transitions are possible from this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Voided)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record of one status change, persisted to the status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNote {
    /// Document whose status changed.
    pub document: DocumentRef,
    /// Status before the change.
    pub from: DocumentStatus,
    /// Status after the change.
    pub to: DocumentStatus,
    /// Optional free-text note.
    pub note: Option<String>,
}

/// A document with a lifecycle status.
///
/// Implementors supply their transition table. Every status change goes
/// through [`Statusable::transition`], which validates the move and
/// produces the history record.
pub trait Statusable {
    /// Returns the document's reference.
    fn document_ref(&self) -> DocumentRef;

    /// Returns the current status.
    fn current_status(&self) -> DocumentStatus;

    /// Returns true if `from -> to` is a legal move for this document type.
    fn allows_transition(from: DocumentStatus, to: DocumentStatus) -> bool;

    /// Overwrites the stored status. Only called by [`Statusable::transition`].
    #[doc(hidden)]
    fn set_status(&mut self, status: DocumentStatus);

    /// Moves the document to `new_status`.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::InvalidState` if the move is not allowed.
    fn transition(
        &mut self,
        new_status: DocumentStatus,
        note: Option<String>,
    ) -> Result<StatusNote, FinanceError> {
        let from = self.current_status();
        if !Self::allows_transition(from, new_status) {
            return Err(FinanceError::invalid_state(
                &self.document_ref(),
                from,
                format!("a status that can move to {new_status}"),
            ));
        }
        self.set_status(new_status);
        Ok(StatusNote {
            document: self.document_ref(),
            from,
            to: new_status,
            note,
        })
    }
}
