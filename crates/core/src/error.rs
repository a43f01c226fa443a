//! Error types for posting, allocation, and hold operations.
//!
//! Every operation in this crate is all-or-nothing: an error means no
//! state change was produced, so callers abort their transaction and
//! surface the error.

use chrono::NaiveDate;
use folio_shared::AppError;
use folio_shared::types::{CompanyId, JournalEntryId, PaymentVoucherId, SupplierInvoiceId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::collab::Capability;
use crate::document::DocumentRef;

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-correctable input problem.
    InvalidInput,
    /// Wrong lifecycle status for the requested operation.
    InvalidState,
    /// The operation was already performed.
    AlreadyDone,
    /// No fiscal year or accounting period covers the date.
    PeriodNotFound,
    /// The accounting period is closed.
    PeriodClosed,
    /// Debits and credits differ.
    UnbalancedEntry,
    /// A referenced record does not exist.
    NotFound,
    /// The acting user lacks the capability.
    Unauthorized,
    /// Concurrent modification detected.
    Conflict,
    /// Storage failure.
    Infrastructure,
}

/// Errors that can occur in the posting and allocation engines.
#[derive(Debug, Error)]
pub enum FinanceError {
    // ========== Input Errors ==========
    /// Generic caller-correctable problem.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An invoice needs at least one line item before it can be posted.
    #[error("{0} has no line items")]
    MissingLineItems(DocumentRef),

    /// A payment voucher needs an allocation before it can be posted.
    #[error("Payment voucher {0} has no invoice allocation")]
    NoAllocationTarget(PaymentVoucherId),

    /// Hold or reversal reason is blank.
    #[error("A non-blank reason is required")]
    BlankReason,

    /// Requested allocations exceed the voucher's unallocated amount.
    #[error("Requested allocation {requested} exceeds unallocated amount {unallocated}")]
    AllocationExceedsUnallocated {
        /// Sum of requested amounts.
        requested: Decimal,
        /// Voucher's unallocated amount.
        unallocated: Decimal,
    },

    /// An allocation exceeds what is still owed on the invoice.
    #[error("Allocation {requested} exceeds outstanding {outstanding} on invoice {invoice_id}")]
    AllocationExceedsOutstanding {
        /// Target invoice.
        invoice_id: SupplierInvoiceId,
        /// Requested amount.
        requested: Decimal,
        /// Invoice's outstanding amount at that point of the batch.
        outstanding: Decimal,
    },

    /// Invoice cannot receive funds from this voucher.
    #[error("Invoice {invoice_id} cannot be allocated: {reason}")]
    InvalidAllocationTarget {
        /// Target invoice.
        invoice_id: SupplierInvoiceId,
        /// Why the target was rejected.
        reason: String,
    },

    /// Account mapping is incomplete or does not fit the document.
    #[error("Invalid account mapping: {0}")]
    InvalidAccountMapping(String),

    // ========== State Errors ==========
    /// Wrong lifecycle status for the operation.
    #[error("{document} is {current}, expected {required}")]
    InvalidState {
        /// Document description.
        document: String,
        /// Current status.
        current: String,
        /// Status (or statuses) the operation requires.
        required: String,
    },

    /// Voucher is on hold.
    #[error("Payment voucher {voucher_id} is on hold: {reason}")]
    VoucherOnHold {
        /// The held voucher.
        voucher_id: PaymentVoucherId,
        /// Reason recorded when the hold was placed.
        reason: String,
    },

    // ========== Already Done ==========
    /// Source document already has a journal entry.
    #[error("{document} is already posted as journal entry {journal_entry_id}")]
    AlreadyPosted {
        /// Document description.
        document: String,
        /// The existing journal entry.
        journal_entry_id: JournalEntryId,
    },

    /// Journal entry already has a reversal.
    #[error("Journal entry {entry_id} is already reversed by {reversal_entry_id}")]
    AlreadyReversed {
        /// The original entry.
        entry_id: JournalEntryId,
        /// The existing reversing entry.
        reversal_entry_id: JournalEntryId,
    },

    // ========== Fiscal Errors ==========
    /// No fiscal year or accounting period contains the date.
    #[error("No accounting period found for company {company_id} on {date}")]
    PeriodNotFound {
        /// Company being posted for.
        company_id: CompanyId,
        /// Document date.
        date: NaiveDate,
    },

    /// Accounting period is closed.
    #[error("Accounting period {period} is closed for company {company_id} on {date}")]
    PeriodClosed {
        /// Company being posted for.
        company_id: CompanyId,
        /// Document date.
        date: NaiveDate,
        /// Period name.
        period: String,
    },

    // ========== Invariant Errors ==========
    /// Journal lines do not balance.
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Total debit.
        debit: Decimal,
        /// Total credit.
        credit: Decimal,
    },

    // ========== Access & Storage ==========
    /// Referenced record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Acting user lacks the capability.
    #[error("Not authorized to {0}")]
    Unauthorized(Capability),

    /// Concurrent modification detected.
    #[error("Concurrent modification of {0}, please retry")]
    ConcurrentModification(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl FinanceError {
    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_)
            | Self::MissingLineItems(_)
            | Self::NoAllocationTarget(_)
            | Self::BlankReason
            | Self::AllocationExceedsUnallocated { .. }
            | Self::AllocationExceedsOutstanding { .. }
            | Self::InvalidAllocationTarget { .. }
            | Self::InvalidAccountMapping(_) => ErrorKind::InvalidInput,
            Self::InvalidState { .. } | Self::VoucherOnHold { .. } => ErrorKind::InvalidState,
            Self::AlreadyPosted { .. } | Self::AlreadyReversed { .. } => ErrorKind::AlreadyDone,
            Self::PeriodNotFound { .. } => ErrorKind::PeriodNotFound,
            Self::PeriodClosed { .. } => ErrorKind::PeriodClosed,
            Self::UnbalancedEntry { .. } => ErrorKind::UnbalancedEntry,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::ConcurrentModification(_) => ErrorKind::Conflict,
            Self::Database(_) => ErrorKind::Infrastructure,
        }
    }

    /// Returns the stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::MissingLineItems(_) => "MISSING_LINE_ITEMS",
            Self::NoAllocationTarget(_) => "NO_ALLOCATION_TARGET",
            Self::BlankReason => "BLANK_REASON",
            Self::AllocationExceedsUnallocated { .. } => "ALLOCATION_EXCEEDS_UNALLOCATED",
            Self::AllocationExceedsOutstanding { .. } => "ALLOCATION_EXCEEDS_OUTSTANDING",
            Self::InvalidAllocationTarget { .. } => "INVALID_ALLOCATION_TARGET",
            Self::InvalidAccountMapping(_) => "INVALID_ACCOUNT_MAPPING",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::VoucherOnHold { .. } => "VOUCHER_ON_HOLD",
            Self::AlreadyPosted { .. } => "ALREADY_POSTED",
            Self::AlreadyReversed { .. } => "ALREADY_REVERSED",
            Self::PeriodNotFound { .. } => "PERIOD_NOT_FOUND",
            Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Nothing in this crate retries; the flag is for caller policy.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }

    /// Builds an `InvalidState` error for a document.
    pub(crate) fn invalid_state(
        document: &DocumentRef,
        current: impl std::fmt::Display,
        required: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            document: document.to_string(),
            current: current.to_string(),
            required: required.into(),
        }
    }
}

impl From<FinanceError> for AppError {
    fn from(err: FinanceError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::InvalidInput => Self::Validation(message),
            ErrorKind::InvalidState => Self::InvalidState(message),
            ErrorKind::AlreadyDone | ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::PeriodNotFound | ErrorKind::PeriodClosed => Self::Configuration(message),
            ErrorKind::UnbalancedEntry => Self::Internal(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Unauthorized => Self::Forbidden(message),
            ErrorKind::Infrastructure => Self::Database(message),
        }
    }
}
