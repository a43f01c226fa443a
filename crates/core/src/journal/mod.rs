//! Journal entries and the posting engine.
//!
//! - `types` - Journal entry and line types
//! - `mapping` - Caller-chosen account mappings per document type
//! - `builder` - Line set construction
//! - `validation` - Balance validation
//! - `posting` - Source document posting
//! - `reversal` - Reversing entries

pub mod builder;
pub mod mapping;
pub mod posting;
pub mod reversal;
pub mod types;
pub mod validation;

#[cfg(test)]
mod posting_props;
#[cfg(test)]
mod reversal_props;

pub use mapping::{
    AccountMapping, DebitNoteAccounts, InvoiceAccounts, PaymentAccounts, SalesInvoiceAccounts,
};
pub use posting::{PostingContext, PostingOutcome, PostingRequest, PostingService};
pub use reversal::{ReversalOutcome, ReversalRequest, ReversalService};
pub use types::{
    JournalEntry, JournalEntryType, JournalLine, JournalReference, JournalStatus, JournalTotals,
    ReferenceType,
};
pub use validation::validate_lines;
