//! Entity re-exports.

pub use super::accounting_periods::Entity as AccountingPeriods;
pub use super::debit_notes::Entity as DebitNotes;
pub use super::document_status_history::Entity as DocumentStatusHistory;
pub use super::exchange_rates::Entity as ExchangeRates;
pub use super::fiscal_years::Entity as FiscalYears;
pub use super::journal_entries::Entity as JournalEntries;
pub use super::journal_entry_lines::Entity as JournalEntryLines;
pub use super::payable_ledger::Entity as PayableLedger;
pub use super::payment_voucher_allocations::Entity as PaymentVoucherAllocations;
pub use super::payment_vouchers::Entity as PaymentVouchers;
pub use super::sales_invoice_lines::Entity as SalesInvoiceLines;
pub use super::sales_invoices::Entity as SalesInvoices;
pub use super::supplier_invoice_lines::Entity as SupplierInvoiceLines;
pub use super::supplier_invoices::Entity as SupplierInvoices;
