//! `SeaORM` entity definitions.

pub mod prelude;

pub mod accounting_periods;
pub mod debit_notes;
pub mod document_status_history;
pub mod exchange_rates;
pub mod fiscal_years;
pub mod journal_entries;
pub mod journal_entry_lines;
pub mod payable_ledger;
pub mod payment_voucher_allocations;
pub mod payment_vouchers;
pub mod sales_invoice_lines;
pub mod sales_invoices;
pub mod sea_orm_active_enums;
pub mod supplier_invoice_lines;
pub mod supplier_invoices;
