//! Conversions between entity models and core domain types.

use chrono::{DateTime, Utc};
use folio_core::FinanceError;
use folio_core::allocation::PaymentAllocation;
use folio_core::currency::ExchangeRate;
use folio_core::document::{
    DebitNote, DocumentKind, DocumentRef, DocumentStatus, HoldState, InvoiceLine, PaymentVoucher,
    PostingState, SalesInvoice, StatusNote, SupplierInvoice,
};
use folio_core::fiscal::{AccountingPeriod, FiscalYear, PeriodStatus};
use folio_core::journal::{
    JournalEntry, JournalEntryType, JournalLine, JournalReference, JournalStatus, ReferenceType,
};
use folio_core::payable::{PayableLedgerRow, PayableTransactionType};
use folio_shared::types::{
    AccountId, AccountingPeriodId, AllocationId, CompanyId, CostCenterId, CurrencyCode,
    CustomerId, DebitNoteId, FiscalYearId, JournalEntryId, JournalLineId, PayableLedgerId,
    PaymentVoucherId, SalesInvoiceId, SupplierId, SupplierInvoiceId, UserId,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::ActiveValue::{NotSet, Unchanged};
use sea_orm::{DbErr, Set, SqlErr};
use uuid::Uuid;

use crate::entities::{
    accounting_periods, debit_notes, document_status_history, exchange_rates, fiscal_years,
    journal_entries, journal_entry_lines, payable_ledger, payment_voucher_allocations,
    payment_vouchers, sales_invoice_lines, sales_invoices, sea_orm_active_enums as db,
    supplier_invoice_lines, supplier_invoices,
};

// ============================================================================
// Errors and scalars
// ============================================================================

/// Maps a database error onto the finance taxonomy.
///
/// Unique violations mean a concurrent writer got there first.
pub(crate) fn db_err(err: DbErr) -> FinanceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            FinanceError::ConcurrentModification(detail)
        }
        _ => FinanceError::Database(err.to_string()),
    }
}

pub(crate) fn currency(code: &str) -> Result<CurrencyCode, FinanceError> {
    CurrencyCode::parse(code.trim())
        .map_err(|e| FinanceError::Database(format!("stored currency {code:?}: {e}")))
}

pub(crate) fn utc(at: DateTimeWithTimeZone) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

pub(crate) fn tz(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.into()
}

// ============================================================================
// Enums
// ============================================================================

pub(crate) fn document_status_to_core(status: db::DocumentStatus) -> DocumentStatus {
    match status {
        db::DocumentStatus::Draft => DocumentStatus::Draft,
        db::DocumentStatus::Submitted => DocumentStatus::Submitted,
        db::DocumentStatus::Approved => DocumentStatus::Approved,
        db::DocumentStatus::PartiallyPaid => DocumentStatus::PartiallyPaid,
        db::DocumentStatus::Paid => DocumentStatus::Paid,
        db::DocumentStatus::Cancelled => DocumentStatus::Cancelled,
        db::DocumentStatus::Voided => DocumentStatus::Voided,
    }
}

pub(crate) fn document_status_to_db(status: DocumentStatus) -> db::DocumentStatus {
    match status {
        DocumentStatus::Draft => db::DocumentStatus::Draft,
        DocumentStatus::Submitted => db::DocumentStatus::Submitted,
        DocumentStatus::Approved => db::DocumentStatus::Approved,
        DocumentStatus::PartiallyPaid => db::DocumentStatus::PartiallyPaid,
        DocumentStatus::Paid => db::DocumentStatus::Paid,
        DocumentStatus::Cancelled => db::DocumentStatus::Cancelled,
        DocumentStatus::Voided => db::DocumentStatus::Voided,
    }
}

pub(crate) fn document_kind_to_core(kind: db::DocumentKind) -> DocumentKind {
    match kind {
        db::DocumentKind::SupplierInvoice => DocumentKind::SupplierInvoice,
        db::DocumentKind::DebitNote => DocumentKind::DebitNote,
        db::DocumentKind::PaymentVoucher => DocumentKind::PaymentVoucher,
        db::DocumentKind::SalesInvoice => DocumentKind::SalesInvoice,
    }
}

pub(crate) fn document_kind_to_db(kind: DocumentKind) -> db::DocumentKind {
    match kind {
        DocumentKind::SupplierInvoice => db::DocumentKind::SupplierInvoice,
        DocumentKind::DebitNote => db::DocumentKind::DebitNote,
        DocumentKind::PaymentVoucher => db::DocumentKind::PaymentVoucher,
        DocumentKind::SalesInvoice => db::DocumentKind::SalesInvoice,
    }
}

fn journal_status_to_core(status: db::JournalStatus) -> JournalStatus {
    match status {
        db::JournalStatus::Draft => JournalStatus::Draft,
        db::JournalStatus::Submitted => JournalStatus::Submitted,
        db::JournalStatus::Posted => JournalStatus::Posted,
        db::JournalStatus::Cancelled => JournalStatus::Cancelled,
    }
}

fn journal_status_to_db(status: JournalStatus) -> db::JournalStatus {
    match status {
        JournalStatus::Draft => db::JournalStatus::Draft,
        JournalStatus::Submitted => db::JournalStatus::Submitted,
        JournalStatus::Posted => db::JournalStatus::Posted,
        JournalStatus::Cancelled => db::JournalStatus::Cancelled,
    }
}

fn entry_type_to_core(entry_type: db::JournalEntryType) -> JournalEntryType {
    match entry_type {
        db::JournalEntryType::Manual => JournalEntryType::Manual,
        db::JournalEntryType::Automatic => JournalEntryType::Automatic,
        db::JournalEntryType::Opening => JournalEntryType::Opening,
        db::JournalEntryType::Closing => JournalEntryType::Closing,
        db::JournalEntryType::Adjusting => JournalEntryType::Adjusting,
        db::JournalEntryType::Reversing => JournalEntryType::Reversing,
        db::JournalEntryType::Reclassification => JournalEntryType::Reclassification,
        db::JournalEntryType::Intercompany => JournalEntryType::Intercompany,
    }
}

fn entry_type_to_db(entry_type: JournalEntryType) -> db::JournalEntryType {
    match entry_type {
        JournalEntryType::Manual => db::JournalEntryType::Manual,
        JournalEntryType::Automatic => db::JournalEntryType::Automatic,
        JournalEntryType::Opening => db::JournalEntryType::Opening,
        JournalEntryType::Closing => db::JournalEntryType::Closing,
        JournalEntryType::Adjusting => db::JournalEntryType::Adjusting,
        JournalEntryType::Reversing => db::JournalEntryType::Reversing,
        JournalEntryType::Reclassification => db::JournalEntryType::Reclassification,
        JournalEntryType::Intercompany => db::JournalEntryType::Intercompany,
    }
}

fn reference_type_to_core(reference_type: db::JournalReferenceType) -> ReferenceType {
    match reference_type {
        db::JournalReferenceType::SupplierInvoice => ReferenceType::SupplierInvoice,
        db::JournalReferenceType::DebitNote => ReferenceType::DebitNote,
        db::JournalReferenceType::PaymentVoucher => ReferenceType::PaymentVoucher,
        db::JournalReferenceType::SalesInvoice => ReferenceType::SalesInvoice,
        db::JournalReferenceType::JournalEntry => ReferenceType::JournalEntry,
    }
}

pub(crate) fn reference_type_to_db(reference_type: ReferenceType) -> db::JournalReferenceType {
    match reference_type {
        ReferenceType::SupplierInvoice => db::JournalReferenceType::SupplierInvoice,
        ReferenceType::DebitNote => db::JournalReferenceType::DebitNote,
        ReferenceType::PaymentVoucher => db::JournalReferenceType::PaymentVoucher,
        ReferenceType::SalesInvoice => db::JournalReferenceType::SalesInvoice,
        ReferenceType::JournalEntry => db::JournalReferenceType::JournalEntry,
    }
}

fn payable_type_to_core(t: db::PayableTransactionType) -> PayableTransactionType {
    match t {
        db::PayableTransactionType::Invoice => PayableTransactionType::Invoice,
        db::PayableTransactionType::DebitNote => PayableTransactionType::DebitNote,
        db::PayableTransactionType::Payment => PayableTransactionType::Payment,
        db::PayableTransactionType::Adjustment => PayableTransactionType::Adjustment,
    }
}

fn payable_type_to_db(t: PayableTransactionType) -> db::PayableTransactionType {
    match t {
        PayableTransactionType::Invoice => db::PayableTransactionType::Invoice,
        PayableTransactionType::DebitNote => db::PayableTransactionType::DebitNote,
        PayableTransactionType::Payment => db::PayableTransactionType::Payment,
        PayableTransactionType::Adjustment => db::PayableTransactionType::Adjustment,
    }
}

// ============================================================================
// Fiscal calendar and rates
// ============================================================================

pub(crate) fn fiscal_year(model: fiscal_years::Model) -> FiscalYear {
    FiscalYear {
        id: FiscalYearId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        name: model.name,
        start_date: model.start_date,
        end_date: model.end_date,
    }
}

pub(crate) fn accounting_period(model: accounting_periods::Model) -> AccountingPeriod {
    AccountingPeriod {
        id: AccountingPeriodId::from_uuid(model.id),
        fiscal_year_id: FiscalYearId::from_uuid(model.fiscal_year_id),
        period_number: model.period_number,
        name: model.name,
        start_date: model.start_date,
        end_date: model.end_date,
        status: match model.status {
            db::PeriodStatus::Open => PeriodStatus::Open,
            db::PeriodStatus::Closed => PeriodStatus::Closed,
        },
    }
}

pub(crate) fn exchange_rate(model: &exchange_rates::Model) -> Result<ExchangeRate, FinanceError> {
    Ok(ExchangeRate::new(
        currency(&model.from_currency)?,
        currency(&model.to_currency)?,
        model.rate,
        model.effective_date,
    ))
}

// ============================================================================
// Source documents
// ============================================================================

fn posting_state(
    journal_entry_id: Option<Uuid>,
    is_posted_to_gl: bool,
    posted_to_gl_at: Option<DateTimeWithTimeZone>,
) -> PostingState {
    PostingState {
        journal_entry_id: journal_entry_id.map(JournalEntryId::from_uuid),
        is_posted_to_gl,
        posted_to_gl_at: posted_to_gl_at.map(utc),
    }
}

fn invoice_line(
    account_id: Uuid,
    description: String,
    quantity: rust_decimal::Decimal,
    unit_price: rust_decimal::Decimal,
    line_total: rust_decimal::Decimal,
    cost_center_id: Option<Uuid>,
) -> InvoiceLine {
    InvoiceLine {
        account_id: AccountId::from_uuid(account_id),
        description,
        quantity,
        unit_price,
        line_total,
        cost_center_id: cost_center_id.map(CostCenterId::from_uuid),
    }
}

pub(crate) fn supplier_invoice(
    model: supplier_invoices::Model,
    lines: Vec<supplier_invoice_lines::Model>,
) -> Result<SupplierInvoice, FinanceError> {
    Ok(SupplierInvoice {
        id: SupplierInvoiceId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        supplier_id: SupplierId::from_uuid(model.supplier_id),
        currency: currency(&model.currency)?,
        invoice_number: model.invoice_number,
        invoice_date: model.invoice_date,
        due_date: model.due_date,
        exchange_rate: model.exchange_rate,
        subtotal: model.subtotal,
        tax_amount: model.tax_amount,
        tax_recoverable: model.tax_recoverable,
        discount_amount: model.discount_amount,
        total_amount: model.total_amount,
        paid_amount: model.paid_amount,
        outstanding_amount: model.outstanding_amount,
        status: document_status_to_core(model.status),
        lines: lines
            .into_iter()
            .map(|l| {
                invoice_line(
                    l.account_id,
                    l.description,
                    l.quantity,
                    l.unit_price,
                    l.line_total,
                    l.cost_center_id,
                )
            })
            .collect(),
        posting: posting_state(
            model.journal_entry_id,
            model.is_posted_to_gl,
            model.posted_to_gl_at,
        ),
    })
}

pub(crate) fn sales_invoice(
    model: sales_invoices::Model,
    lines: Vec<sales_invoice_lines::Model>,
) -> Result<SalesInvoice, FinanceError> {
    Ok(SalesInvoice {
        id: SalesInvoiceId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        customer_id: CustomerId::from_uuid(model.customer_id),
        currency: currency(&model.currency)?,
        invoice_number: model.invoice_number,
        invoice_date: model.invoice_date,
        due_date: model.due_date,
        exchange_rate: model.exchange_rate,
        subtotal: model.subtotal,
        tax_amount: model.tax_amount,
        discount_amount: model.discount_amount,
        total_amount: model.total_amount,
        paid_amount: model.paid_amount,
        outstanding_amount: model.outstanding_amount,
        status: document_status_to_core(model.status),
        lines: lines
            .into_iter()
            .map(|l| {
                invoice_line(
                    l.account_id,
                    l.description,
                    l.quantity,
                    l.unit_price,
                    l.line_total,
                    l.cost_center_id,
                )
            })
            .collect(),
        posting: posting_state(
            model.journal_entry_id,
            model.is_posted_to_gl,
            model.posted_to_gl_at,
        ),
    })
}

pub(crate) fn debit_note(model: debit_notes::Model) -> Result<DebitNote, FinanceError> {
    Ok(DebitNote {
        id: DebitNoteId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        supplier_id: SupplierId::from_uuid(model.supplier_id),
        supplier_invoice_id: model.supplier_invoice_id.map(SupplierInvoiceId::from_uuid),
        currency: currency(&model.currency)?,
        note_number: model.note_number,
        note_date: model.note_date,
        exchange_rate: model.exchange_rate,
        reason: model.reason,
        total_amount: model.total_amount,
        paid_amount: model.paid_amount,
        outstanding_amount: model.outstanding_amount,
        status: document_status_to_core(model.status),
        posting: posting_state(
            model.journal_entry_id,
            model.is_posted_to_gl,
            model.posted_to_gl_at,
        ),
    })
}

pub(crate) fn payment_voucher(
    model: payment_vouchers::Model,
) -> Result<PaymentVoucher, FinanceError> {
    Ok(PaymentVoucher {
        id: PaymentVoucherId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        supplier_id: SupplierId::from_uuid(model.supplier_id),
        currency: currency(&model.currency)?,
        voucher_number: model.voucher_number,
        payment_date: model.payment_date,
        exchange_rate: model.exchange_rate,
        amount: model.amount,
        allocated_amount: model.allocated_amount,
        unallocated_amount: model.unallocated_amount,
        status: document_status_to_core(model.status),
        hold: HoldState {
            is_on_hold: model.is_on_hold,
            hold_reason: model.hold_reason,
            held_by: model.held_by.map(UserId::from_uuid),
            held_at: model.held_at.map(utc),
        },
        posting: posting_state(
            model.journal_entry_id,
            model.is_posted_to_gl,
            model.posted_to_gl_at,
        ),
    })
}

/// Writes the mutable fields of a supplier invoice onto its row.
pub(crate) fn supplier_invoice_update(
    invoice: &SupplierInvoice,
    now: DateTime<Utc>,
) -> supplier_invoices::ActiveModel {
    supplier_invoices::ActiveModel {
        id: Unchanged(invoice.id.into_inner()),
        paid_amount: Set(invoice.paid_amount),
        outstanding_amount: Set(invoice.outstanding_amount),
        status: Set(document_status_to_db(invoice.status)),
        journal_entry_id: Set(invoice.posting.journal_entry_id.map(JournalEntryId::into_inner)),
        is_posted_to_gl: Set(invoice.posting.is_posted_to_gl),
        posted_to_gl_at: Set(invoice.posting.posted_to_gl_at.map(tz)),
        updated_at: Set(tz(now)),
        ..Default::default()
    }
}

pub(crate) fn sales_invoice_update(
    invoice: &SalesInvoice,
    now: DateTime<Utc>,
) -> sales_invoices::ActiveModel {
    sales_invoices::ActiveModel {
        id: Unchanged(invoice.id.into_inner()),
        paid_amount: Set(invoice.paid_amount),
        outstanding_amount: Set(invoice.outstanding_amount),
        status: Set(document_status_to_db(invoice.status)),
        journal_entry_id: Set(invoice.posting.journal_entry_id.map(JournalEntryId::into_inner)),
        is_posted_to_gl: Set(invoice.posting.is_posted_to_gl),
        posted_to_gl_at: Set(invoice.posting.posted_to_gl_at.map(tz)),
        updated_at: Set(tz(now)),
        ..Default::default()
    }
}

pub(crate) fn debit_note_update(note: &DebitNote, now: DateTime<Utc>) -> debit_notes::ActiveModel {
    debit_notes::ActiveModel {
        id: Unchanged(note.id.into_inner()),
        paid_amount: Set(note.paid_amount),
        outstanding_amount: Set(note.outstanding_amount),
        status: Set(document_status_to_db(note.status)),
        journal_entry_id: Set(note.posting.journal_entry_id.map(JournalEntryId::into_inner)),
        is_posted_to_gl: Set(note.posting.is_posted_to_gl),
        posted_to_gl_at: Set(note.posting.posted_to_gl_at.map(tz)),
        updated_at: Set(tz(now)),
        ..Default::default()
    }
}

/// Writes the mutable fields of a voucher onto its row.
///
/// `base_amount` is only written when given.
pub(crate) fn payment_voucher_update(
    voucher: &PaymentVoucher,
    base_amount: Option<rust_decimal::Decimal>,
    now: DateTime<Utc>,
) -> payment_vouchers::ActiveModel {
    payment_vouchers::ActiveModel {
        id: Unchanged(voucher.id.into_inner()),
        base_amount: base_amount.map_or(NotSet, Set),
        allocated_amount: Set(voucher.allocated_amount),
        unallocated_amount: Set(voucher.unallocated_amount),
        status: Set(document_status_to_db(voucher.status)),
        is_on_hold: Set(voucher.hold.is_on_hold),
        hold_reason: Set(voucher.hold.hold_reason.clone()),
        held_by: Set(voucher.hold.held_by.map(UserId::into_inner)),
        held_at: Set(voucher.hold.held_at.map(tz)),
        journal_entry_id: Set(voucher.posting.journal_entry_id.map(JournalEntryId::into_inner)),
        is_posted_to_gl: Set(voucher.posting.is_posted_to_gl),
        posted_to_gl_at: Set(voucher.posting.posted_to_gl_at.map(tz)),
        updated_at: Set(tz(now)),
        ..Default::default()
    }
}

pub(crate) fn supplier_invoice_active(
    invoice: &SupplierInvoice,
    now: DateTime<Utc>,
) -> supplier_invoices::ActiveModel {
    supplier_invoices::ActiveModel {
        id: Set(invoice.id.into_inner()),
        company_id: Set(invoice.company_id.into_inner()),
        supplier_id: Set(invoice.supplier_id.into_inner()),
        invoice_number: Set(invoice.invoice_number.clone()),
        invoice_date: Set(invoice.invoice_date),
        due_date: Set(invoice.due_date),
        currency: Set(invoice.currency.as_str().to_string()),
        exchange_rate: Set(invoice.exchange_rate),
        subtotal: Set(invoice.subtotal),
        tax_amount: Set(invoice.tax_amount),
        tax_recoverable: Set(invoice.tax_recoverable),
        discount_amount: Set(invoice.discount_amount),
        total_amount: Set(invoice.total_amount),
        paid_amount: Set(invoice.paid_amount),
        outstanding_amount: Set(invoice.outstanding_amount),
        status: Set(document_status_to_db(invoice.status)),
        journal_entry_id: Set(invoice.posting.journal_entry_id.map(JournalEntryId::into_inner)),
        is_posted_to_gl: Set(invoice.posting.is_posted_to_gl),
        posted_to_gl_at: Set(invoice.posting.posted_to_gl_at.map(tz)),
        created_at: Set(tz(now)),
        updated_at: Set(tz(now)),
    }
}

pub(crate) fn supplier_invoice_lines_active(
    invoice: &SupplierInvoice,
) -> Vec<supplier_invoice_lines::ActiveModel> {
    invoice
        .lines
        .iter()
        .zip(1..)
        .map(|(line, line_number)| supplier_invoice_lines::ActiveModel {
            id: Set(Uuid::now_v7()),
            supplier_invoice_id: Set(invoice.id.into_inner()),
            line_number: Set(line_number),
            account_id: Set(line.account_id.into_inner()),
            description: Set(line.description.clone()),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            line_total: Set(line.line_total),
            cost_center_id: Set(line.cost_center_id.map(CostCenterId::into_inner)),
        })
        .collect()
}

pub(crate) fn sales_invoice_active(
    invoice: &SalesInvoice,
    now: DateTime<Utc>,
) -> sales_invoices::ActiveModel {
    sales_invoices::ActiveModel {
        id: Set(invoice.id.into_inner()),
        company_id: Set(invoice.company_id.into_inner()),
        customer_id: Set(invoice.customer_id.into_inner()),
        invoice_number: Set(invoice.invoice_number.clone()),
        invoice_date: Set(invoice.invoice_date),
        due_date: Set(invoice.due_date),
        currency: Set(invoice.currency.as_str().to_string()),
        exchange_rate: Set(invoice.exchange_rate),
        subtotal: Set(invoice.subtotal),
        tax_amount: Set(invoice.tax_amount),
        discount_amount: Set(invoice.discount_amount),
        total_amount: Set(invoice.total_amount),
        paid_amount: Set(invoice.paid_amount),
        outstanding_amount: Set(invoice.outstanding_amount),
        status: Set(document_status_to_db(invoice.status)),
        journal_entry_id: Set(invoice.posting.journal_entry_id.map(JournalEntryId::into_inner)),
        is_posted_to_gl: Set(invoice.posting.is_posted_to_gl),
        posted_to_gl_at: Set(invoice.posting.posted_to_gl_at.map(tz)),
        created_at: Set(tz(now)),
        updated_at: Set(tz(now)),
    }
}

pub(crate) fn sales_invoice_lines_active(
    invoice: &SalesInvoice,
) -> Vec<sales_invoice_lines::ActiveModel> {
    invoice
        .lines
        .iter()
        .zip(1..)
        .map(|(line, line_number)| sales_invoice_lines::ActiveModel {
            id: Set(Uuid::now_v7()),
            sales_invoice_id: Set(invoice.id.into_inner()),
            line_number: Set(line_number),
            account_id: Set(line.account_id.into_inner()),
            description: Set(line.description.clone()),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            line_total: Set(line.line_total),
            cost_center_id: Set(line.cost_center_id.map(CostCenterId::into_inner)),
        })
        .collect()
}

pub(crate) fn debit_note_active(note: &DebitNote, now: DateTime<Utc>) -> debit_notes::ActiveModel {
    debit_notes::ActiveModel {
        id: Set(note.id.into_inner()),
        company_id: Set(note.company_id.into_inner()),
        supplier_id: Set(note.supplier_id.into_inner()),
        supplier_invoice_id: Set(note.supplier_invoice_id.map(SupplierInvoiceId::into_inner)),
        note_number: Set(note.note_number.clone()),
        note_date: Set(note.note_date),
        currency: Set(note.currency.as_str().to_string()),
        exchange_rate: Set(note.exchange_rate),
        reason: Set(note.reason.clone()),
        total_amount: Set(note.total_amount),
        paid_amount: Set(note.paid_amount),
        outstanding_amount: Set(note.outstanding_amount),
        status: Set(document_status_to_db(note.status)),
        journal_entry_id: Set(note.posting.journal_entry_id.map(JournalEntryId::into_inner)),
        is_posted_to_gl: Set(note.posting.is_posted_to_gl),
        posted_to_gl_at: Set(note.posting.posted_to_gl_at.map(tz)),
        created_at: Set(tz(now)),
        updated_at: Set(tz(now)),
    }
}

pub(crate) fn payment_voucher_active(
    voucher: &PaymentVoucher,
    base_amount: rust_decimal::Decimal,
    now: DateTime<Utc>,
) -> payment_vouchers::ActiveModel {
    payment_vouchers::ActiveModel {
        id: Set(voucher.id.into_inner()),
        company_id: Set(voucher.company_id.into_inner()),
        supplier_id: Set(voucher.supplier_id.into_inner()),
        voucher_number: Set(voucher.voucher_number.clone()),
        payment_date: Set(voucher.payment_date),
        currency: Set(voucher.currency.as_str().to_string()),
        exchange_rate: Set(voucher.exchange_rate),
        amount: Set(voucher.amount),
        base_amount: Set(base_amount),
        allocated_amount: Set(voucher.allocated_amount),
        unallocated_amount: Set(voucher.unallocated_amount),
        status: Set(document_status_to_db(voucher.status)),
        is_on_hold: Set(voucher.hold.is_on_hold),
        hold_reason: Set(voucher.hold.hold_reason.clone()),
        held_by: Set(voucher.hold.held_by.map(UserId::into_inner)),
        held_at: Set(voucher.hold.held_at.map(tz)),
        journal_entry_id: Set(voucher.posting.journal_entry_id.map(JournalEntryId::into_inner)),
        is_posted_to_gl: Set(voucher.posting.is_posted_to_gl),
        posted_to_gl_at: Set(voucher.posting.posted_to_gl_at.map(tz)),
        created_at: Set(tz(now)),
        updated_at: Set(tz(now)),
    }
}

// ============================================================================
// Journal
// ============================================================================

pub(crate) fn journal_entry(
    model: journal_entries::Model,
    lines: Vec<journal_entry_lines::Model>,
) -> Result<JournalEntry, FinanceError> {
    Ok(JournalEntry {
        id: JournalEntryId::from_uuid(model.id),
        currency: currency(&model.currency)?,
        entry_number: model.entry_number,
        company_id: CompanyId::from_uuid(model.company_id),
        fiscal_year_id: FiscalYearId::from_uuid(model.fiscal_year_id),
        accounting_period_id: AccountingPeriodId::from_uuid(model.accounting_period_id),
        entry_type: entry_type_to_core(model.entry_type),
        entry_date: model.entry_date,
        exchange_rate: model.exchange_rate,
        description: model.description,
        reference: JournalReference {
            reference_type: reference_type_to_core(model.reference_type),
            reference_id: model.reference_id,
            reference_number: model.reference_number,
        },
        total_debit: model.total_debit,
        total_credit: model.total_credit,
        status: journal_status_to_core(model.status),
        posted_by: model.posted_by.map(UserId::from_uuid),
        posted_at: model.posted_at.map(utc),
        reversal_of: model.reversal_of.map(JournalEntryId::from_uuid),
        reversal_entry_id: model.reversal_entry_id.map(JournalEntryId::from_uuid),
        lines: lines
            .into_iter()
            .map(|l| JournalLine {
                id: JournalLineId::from_uuid(l.id),
                line_number: l.line_number,
                account_id: AccountId::from_uuid(l.account_id),
                debit: l.debit,
                credit: l.credit,
                base_debit: l.base_debit,
                base_credit: l.base_credit,
                description: l.description,
                cost_center_id: l.cost_center_id.map(CostCenterId::from_uuid),
            })
            .collect(),
    })
}

pub(crate) fn journal_entry_active(
    entry: &JournalEntry,
    now: DateTime<Utc>,
) -> journal_entries::ActiveModel {
    journal_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        company_id: Set(entry.company_id.into_inner()),
        entry_number: Set(entry.entry_number.clone()),
        fiscal_year_id: Set(entry.fiscal_year_id.into_inner()),
        accounting_period_id: Set(entry.accounting_period_id.into_inner()),
        entry_type: Set(entry_type_to_db(entry.entry_type)),
        entry_date: Set(entry.entry_date),
        currency: Set(entry.currency.as_str().to_string()),
        exchange_rate: Set(entry.exchange_rate),
        description: Set(entry.description.clone()),
        reference_type: Set(reference_type_to_db(entry.reference.reference_type)),
        reference_id: Set(entry.reference.reference_id),
        reference_number: Set(entry.reference.reference_number.clone()),
        total_debit: Set(entry.total_debit),
        total_credit: Set(entry.total_credit),
        status: Set(journal_status_to_db(entry.status)),
        posted_by: Set(entry.posted_by.map(UserId::into_inner)),
        posted_at: Set(entry.posted_at.map(tz)),
        reversal_of: Set(entry.reversal_of.map(JournalEntryId::into_inner)),
        reversal_entry_id: Set(entry.reversal_entry_id.map(JournalEntryId::into_inner)),
        created_at: Set(tz(now)),
        updated_at: Set(tz(now)),
    }
}

pub(crate) fn journal_line_active(
    entry_id: JournalEntryId,
    line: &JournalLine,
) -> journal_entry_lines::ActiveModel {
    journal_entry_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        journal_entry_id: Set(entry_id.into_inner()),
        line_number: Set(line.line_number),
        account_id: Set(line.account_id.into_inner()),
        debit: Set(line.debit),
        credit: Set(line.credit),
        base_debit: Set(line.base_debit),
        base_credit: Set(line.base_credit),
        description: Set(line.description.clone()),
        cost_center_id: Set(line.cost_center_id.map(CostCenterId::into_inner)),
    }
}

// ============================================================================
// Allocations, payable ledger, status history
// ============================================================================

pub(crate) fn allocation(model: payment_voucher_allocations::Model) -> PaymentAllocation {
    PaymentAllocation {
        id: AllocationId::from_uuid(model.id),
        payment_voucher_id: PaymentVoucherId::from_uuid(model.payment_voucher_id),
        supplier_invoice_id: SupplierInvoiceId::from_uuid(model.supplier_invoice_id),
        amount: model.amount,
        created_by: UserId::from_uuid(model.created_by),
        created_at: utc(model.created_at),
    }
}

pub(crate) fn allocation_active(
    allocation: &PaymentAllocation,
) -> payment_voucher_allocations::ActiveModel {
    payment_voucher_allocations::ActiveModel {
        id: Set(allocation.id.into_inner()),
        payment_voucher_id: Set(allocation.payment_voucher_id.into_inner()),
        supplier_invoice_id: Set(allocation.supplier_invoice_id.into_inner()),
        amount: Set(allocation.amount),
        created_by: Set(allocation.created_by.into_inner()),
        created_at: Set(tz(allocation.created_at)),
    }
}

pub(crate) fn payable_row(model: payable_ledger::Model) -> Result<PayableLedgerRow, FinanceError> {
    let reference = match (model.reference_kind, model.reference_id) {
        (Some(kind), Some(id)) => Some(DocumentRef {
            kind: document_kind_to_core(kind),
            id,
            number: model.reference_number.unwrap_or_default(),
        }),
        _ => None,
    };
    Ok(PayableLedgerRow {
        id: PayableLedgerId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        supplier_id: SupplierId::from_uuid(model.supplier_id),
        transaction_date: model.transaction_date,
        transaction_type: payable_type_to_core(model.transaction_type),
        reference,
        currency: currency(&model.currency)?,
        debit: model.debit,
        credit: model.credit,
        exchange_rate: model.exchange_rate,
        rate_effective_date: model.rate_effective_date,
        base_debit: model.base_debit,
        base_credit: model.base_credit,
        balance_foreign: model.balance_foreign,
        balance_base: model.balance_base,
        description: model.description,
        created_at: utc(model.created_at),
    })
}

pub(crate) fn payable_row_active(row: &PayableLedgerRow) -> payable_ledger::ActiveModel {
    payable_ledger::ActiveModel {
        id: Set(row.id.into_inner()),
        company_id: Set(row.company_id.into_inner()),
        supplier_id: Set(row.supplier_id.into_inner()),
        transaction_date: Set(row.transaction_date),
        transaction_type: Set(payable_type_to_db(row.transaction_type)),
        reference_kind: Set(row.reference.as_ref().map(|r| document_kind_to_db(r.kind))),
        reference_id: Set(row.reference.as_ref().map(|r| r.id)),
        reference_number: Set(row.reference.as_ref().map(|r| r.number.clone())),
        currency: Set(row.currency.as_str().to_string()),
        debit: Set(row.debit),
        credit: Set(row.credit),
        exchange_rate: Set(row.exchange_rate),
        rate_effective_date: Set(row.rate_effective_date),
        base_debit: Set(row.base_debit),
        base_credit: Set(row.base_credit),
        balance_foreign: Set(row.balance_foreign),
        balance_base: Set(row.balance_base),
        description: Set(row.description.clone()),
        created_at: Set(tz(row.created_at)),
    }
}

pub(crate) fn status_history_active(
    note: &StatusNote,
    actor: UserId,
    at: DateTime<Utc>,
) -> document_status_history::ActiveModel {
    document_status_history::ActiveModel {
        id: Set(Uuid::now_v7()),
        document_kind: Set(document_kind_to_db(note.document.kind)),
        document_id: Set(note.document.id),
        document_number: Set(note.document.number.clone()),
        from_status: Set(document_status_to_db(note.from)),
        to_status: Set(document_status_to_db(note.to)),
        note: Set(note.note.clone()),
        actor: Set(actor.into_inner()),
        created_at: Set(tz(at)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_status_round_trips_through_db_enum() {
        for status in [
            DocumentStatus::Draft,
            DocumentStatus::Submitted,
            DocumentStatus::Approved,
            DocumentStatus::PartiallyPaid,
            DocumentStatus::Paid,
            DocumentStatus::Cancelled,
            DocumentStatus::Voided,
        ] {
            assert_eq!(document_status_to_core(document_status_to_db(status)), status);
        }
    }

    #[test]
    fn test_stored_currency_is_trimmed() {
        // CHAR(3) columns may come back padded.
        assert_eq!(currency("EUR").unwrap().as_str(), "EUR");
        assert!(matches!(currency("euro"), Err(FinanceError::Database(_))));
    }
}
