//! Source documents and their lifecycle.

pub mod status;
pub mod types;
pub mod workflow;

pub use status::{DocumentKind, DocumentRef, DocumentStatus, StatusNote, Statusable};
pub use types::{
    DebitNote, HoldState, InvoiceLine, PaymentVoucher, PostingState, SalesInvoice, SourceDocument,
    SupplierInvoice, settlement_status,
};
pub use workflow::VoucherWorkflow;
