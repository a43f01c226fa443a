//! Supplier payable sub-ledger.
//!
//! Append-only: rows are computed once from the rows before them and
//! never updated or deleted.

pub mod recorder;
pub mod types;

#[cfg(test)]
mod recorder_props;

pub use recorder::PayableLedgerRecorder;
pub use types::{PayableEntry, PayableLedgerRow, PayableTransactionType};
