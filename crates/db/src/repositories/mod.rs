//! Repository abstractions for data access.
//!
//! Repositories load rows, hand them to the pure services in `folio-core`,
//! and write the outcome back inside one transaction.

mod convert;

pub mod allocation;
pub mod document;
pub mod exchange_rate;
pub mod fiscal;
pub mod payable_ledger;
pub mod posting;
pub mod voucher;

pub use allocation::{AllocationRepository, AllocationResult};
pub use document::{DocumentRepository, StatusHistoryRecord};
pub use exchange_rate::ExchangeRateRepository;
pub use fiscal::{CreateFiscalYearInput, FiscalRepository, FiscalYearWithPeriods};
pub use payable_ledger::{PayableLedgerRepository, SupplierBalance};
pub use posting::{PostedDocument, PostingRepository, ReversedEntry};
pub use voucher::VoucherRepository;
