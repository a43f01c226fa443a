//! Journal posting engine.
//!
//! Turns an approved source document into a balanced, posted journal
//! entry. Nothing is mutated in place: the engine returns a
//! [`PostingOutcome`] carrying every write the caller must persist in one
//! transaction, or an error and no writes at all.
//!
//! Guards run in a fixed order so callers see the most fundamental
//! problem first:
//! 1. lifecycle status matches the type's required status
//! 2. the document has not been posted already
//! 3. type-specific structure (lines, allocations, account mapping)
//! 4. fiscal period resolves and is open

use chrono::{DateTime, Utc};
use folio_shared::types::{CurrencyCode, JournalEntryId, Money, UserId};
use rust_decimal::Decimal;

use super::builder::LineSetBuilder;
use super::mapping::{
    AccountMapping, DebitNoteAccounts, InvoiceAccounts, PaymentAccounts, SalesInvoiceAccounts,
};
use super::types::{
    JournalEntry, JournalEntryType, JournalReference, JournalStatus, ReferenceType,
};
use super::validation::validate_lines;
use crate::collab::{Authorizer, Capability, DocumentNumbering, NumberSeries};
use crate::document::types::advance_settlement;
use crate::document::{
    DebitNote, DocumentStatus, PaymentVoucher, SalesInvoice, SourceDocument, StatusNote,
    Statusable, SupplierInvoice,
};
use crate::error::FinanceError;
use crate::fiscal::FiscalCalendar;
use crate::payable::{PayableEntry, PayableTransactionType};

/// Environment a posting runs in.
#[derive(Clone, Copy)]
pub struct PostingContext<'a> {
    /// Fiscal years and periods of the document's company.
    pub calendar: &'a FiscalCalendar,
    /// Functional currency.
    pub base_currency: &'a CurrencyCode,
    /// Journal entry number source.
    pub numbering: &'a dyn DocumentNumbering,
    /// Capability check and acting user.
    pub authorizer: &'a dyn Authorizer,
    /// Posting timestamp.
    pub now: DateTime<Utc>,
}

/// What to post.
#[derive(Debug, Clone, Copy)]
pub struct PostingRequest<'a> {
    /// Document to post.
    pub document: &'a SourceDocument,
    /// Accounts chosen by the caller.
    pub mapping: &'a AccountMapping,
    /// Invoice a debit note applies to, loaded and locked by the caller.
    pub linked_invoice: Option<&'a SupplierInvoice>,
}

/// Every write produced by a successful posting.
#[derive(Debug, Clone)]
pub struct PostingOutcome {
    /// The posted journal entry with its lines.
    pub entry: JournalEntry,
    /// Source document with posting fields, amounts, and status updated.
    pub document: SourceDocument,
    /// Debit note's linked invoice with amounts and status updated.
    pub linked_invoice: Option<SupplierInvoice>,
    /// Status changes to append to history.
    pub status_notes: Vec<StatusNote>,
    /// Supplier ledger movement to record.
    pub payable_entry: Option<PayableEntry>,
    /// User who posted.
    pub posted_by: UserId,
}

/// Stateless posting engine.
pub struct PostingService;

impl PostingService {
    /// Posts a source document to the general ledger.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` without `Capability::PostToLedger`
    /// - `InvalidState` if the document is not in its required status
    /// - `AlreadyPosted` with the existing entry id
    /// - `MissingLineItems`, `NoAllocationTarget`, `InvalidAccountMapping`,
    ///   `NotFound` for structural problems
    /// - `PeriodNotFound` / `PeriodClosed` from the fiscal gate
    /// - `UnbalancedEntry` if the built lines do not balance
    pub fn post(
        request: PostingRequest<'_>,
        ctx: PostingContext<'_>,
    ) -> Result<PostingOutcome, FinanceError> {
        let posted_by = ctx.authorizer.authorize(Capability::PostToLedger)?;
        let document = request.document;
        let doc_ref = document.document_ref();

        // 1. Status
        let required = document.required_posting_status();
        if document.status() != required {
            return Err(FinanceError::invalid_state(
                &doc_ref,
                document.status(),
                required.as_str(),
            ));
        }

        // 2. Idempotency
        let posting = document.posting();
        if let Some(journal_entry_id) = posting.journal_entry_id {
            return Err(FinanceError::AlreadyPosted {
                document: doc_ref.to_string(),
                journal_entry_id,
            });
        }
        if posting.is_posted_to_gl {
            return Err(FinanceError::invalid_state(
                &doc_ref,
                "posted without a journal entry",
                "not posted",
            ));
        }

        // 3. Structure
        let plan = match (document, request.mapping) {
            (SourceDocument::SupplierInvoice(inv), AccountMapping::SupplierInvoice(accounts)) => {
                Self::plan_supplier_invoice(inv, accounts)?
            }
            (SourceDocument::DebitNote(note), AccountMapping::DebitNote(accounts)) => {
                Self::plan_debit_note(note, accounts, request.linked_invoice)?
            }
            (SourceDocument::PaymentVoucher(pv), AccountMapping::PaymentVoucher(accounts)) => {
                Self::plan_payment_voucher(pv, accounts)?
            }
            (SourceDocument::SalesInvoice(inv), AccountMapping::SalesInvoice(accounts)) => {
                Self::plan_sales_invoice(inv, accounts)?
            }
            (_, mapping) => {
                return Err(FinanceError::InvalidAccountMapping(format!(
                    "{} mapping cannot post {}",
                    mapping.kind(),
                    document.kind()
                )));
            }
        };

        // 4. Fiscal gate
        let company_id = document.company_id();
        let entry_date = document.document_date();
        let resolved = ctx.calendar.resolve_open(company_id, entry_date)?;

        let rate = Self::entry_rate(document.currency(), ctx.base_currency, plan.document_rate);
        let lines = plan.lines.build(rate);
        let totals = validate_lines(&lines)?;

        let entry = JournalEntry {
            id: JournalEntryId::new(),
            entry_number: ctx
                .numbering
                .next_number(NumberSeries::JournalEntry, company_id),
            company_id,
            fiscal_year_id: resolved.fiscal_year.id,
            accounting_period_id: resolved.period.id,
            entry_type: JournalEntryType::Automatic,
            entry_date,
            currency: document.currency().clone(),
            exchange_rate: rate,
            description: plan.description,
            reference: JournalReference {
                reference_type: ReferenceType::from(document.kind()),
                reference_id: doc_ref.id,
                reference_number: doc_ref.number.clone(),
            },
            total_debit: totals.debit,
            total_credit: totals.credit,
            status: JournalStatus::Posted,
            posted_by: Some(posted_by),
            posted_at: Some(ctx.now),
            reversal_of: None,
            reversal_entry_id: None,
            lines,
        };

        let mut updated = document.clone();
        updated.posting_mut().mark_posted(entry.id, ctx.now);
        let mut status_notes = Vec::new();
        let note = format!("Posted as journal entry {}", entry.entry_number);

        let mut linked_invoice = None;
        match &mut updated {
            SourceDocument::SupplierInvoice(inv) => {
                inv.recompute_outstanding();
                let (paid, outstanding) = (inv.paid_amount, inv.outstanding_amount);
                status_notes.extend(advance_settlement(inv, paid, outstanding, &note)?);
            }
            SourceDocument::SalesInvoice(inv) => {
                inv.outstanding_amount = Money::sub(inv.total_amount, inv.paid_amount);
                let (paid, outstanding) = (inv.paid_amount, inv.outstanding_amount);
                status_notes.extend(advance_settlement(inv, paid, outstanding, &note)?);
            }
            SourceDocument::DebitNote(dn) => {
                if let Some(invoice) = request.linked_invoice {
                    let mut invoice = invoice.clone();
                    let applied = format!("Debit note {} applied", dn.note_number);
                    status_notes.extend(invoice.apply_settlement(dn.total_amount, &applied)?);
                    linked_invoice = Some(invoice);
                }
                dn.paid_amount = dn.total_amount;
                dn.outstanding_amount = Decimal::ZERO;
                status_notes.push(dn.transition(DocumentStatus::Paid, Some(note.clone()))?);
            }
            SourceDocument::PaymentVoucher(_) => {}
        }

        Ok(PostingOutcome {
            entry,
            document: updated,
            linked_invoice,
            status_notes,
            payable_entry: plan.payable_entry,
            posted_by,
        })
    }

    /// Rate for the entry header: 1 in base currency, else the document's own rate.
    fn entry_rate(currency: &CurrencyCode, base: &CurrencyCode, document_rate: Decimal) -> Decimal {
        if currency == base || document_rate <= Decimal::ZERO {
            Decimal::ONE
        } else {
            document_rate
        }
    }

    fn plan_supplier_invoice(
        inv: &SupplierInvoice,
        accounts: &InvoiceAccounts,
    ) -> Result<PostingPlan, FinanceError> {
        let Some(first_line) = inv.lines.first() else {
            return Err(FinanceError::MissingLineItems(inv.document_ref()));
        };

        let mut lines = LineSetBuilder::new();
        for line in &inv.lines {
            lines = lines.debit_with_cost_center(
                line.account_id,
                line.line_total,
                line.description.clone(),
                line.cost_center_id,
            );
        }

        if Money::is_positive(inv.tax_amount) {
            lines = if inv.tax_recoverable {
                let input_tax = accounts.input_tax().ok_or_else(|| {
                    FinanceError::InvalidAccountMapping(format!(
                        "{} has recoverable tax {} but no input tax account",
                        inv.document_ref(),
                        inv.tax_amount
                    ))
                })?;
                lines.debit(input_tax, inv.tax_amount, "Input tax")
            } else {
                lines.debit(first_line.account_id, inv.tax_amount, "Non-recoverable tax")
            };
        }

        let lines = lines
            .credit(first_line.account_id, inv.discount_amount, "Discount")
            .credit(
                accounts.payable(),
                inv.total_amount,
                format!("Payable to supplier for {}", inv.invoice_number),
            );

        Ok(PostingPlan {
            lines,
            description: format!("Supplier invoice {}", inv.invoice_number),
            document_rate: inv.exchange_rate,
            payable_entry: Some(PayableEntry {
                company_id: inv.company_id,
                supplier_id: inv.supplier_id,
                transaction_date: inv.invoice_date,
                transaction_type: PayableTransactionType::Invoice,
                reference: Some(inv.document_ref()),
                currency: inv.currency.clone(),
                debit: Decimal::ZERO,
                credit: inv.total_amount,
                base_debit: None,
                base_credit: None,
                description: format!("Supplier invoice {}", inv.invoice_number),
            }),
        })
    }

    fn plan_debit_note(
        note: &DebitNote,
        accounts: &DebitNoteAccounts,
        linked_invoice: Option<&SupplierInvoice>,
    ) -> Result<PostingPlan, FinanceError> {
        if !Money::is_positive(note.total_amount) {
            return Err(FinanceError::InvalidInput(format!(
                "{} amount must be positive, got {}",
                note.document_ref(),
                note.total_amount
            )));
        }

        match (note.supplier_invoice_id, linked_invoice) {
            (None, None) => {}
            (Some(expected), Some(invoice)) if invoice.id == expected => {
                if invoice.supplier_id != note.supplier_id || invoice.company_id != note.company_id
                {
                    return Err(FinanceError::InvalidAllocationTarget {
                        invoice_id: invoice.id,
                        reason: format!("belongs to a different supplier than {}", note.document_ref()),
                    });
                }
                if !invoice.accepts_settlement() {
                    return Err(FinanceError::invalid_state(
                        &invoice.document_ref(),
                        invoice.status,
                        "approved or partially_paid with an outstanding amount",
                    ));
                }
            }
            (Some(expected), _) => {
                return Err(FinanceError::NotFound(format!(
                    "supplier invoice {expected} linked to {}",
                    note.document_ref()
                )));
            }
            (None, Some(invoice)) => {
                return Err(FinanceError::InvalidInput(format!(
                    "{} is not linked to invoice {}",
                    note.document_ref(),
                    invoice.invoice_number
                )));
            }
        }

        let lines = LineSetBuilder::new()
            .debit(
                accounts.payable(),
                note.total_amount,
                format!("Debit note {}", note.note_number),
            )
            .credit(
                accounts.purchase_returns(),
                note.total_amount,
                note.reason.clone().unwrap_or_else(|| "Purchase return".to_string()),
            );

        Ok(PostingPlan {
            lines,
            description: format!("Debit note {}", note.note_number),
            document_rate: note.exchange_rate,
            payable_entry: Some(PayableEntry {
                company_id: note.company_id,
                supplier_id: note.supplier_id,
                transaction_date: note.note_date,
                transaction_type: PayableTransactionType::DebitNote,
                reference: Some(note.document_ref()),
                currency: note.currency.clone(),
                debit: note.total_amount,
                credit: Decimal::ZERO,
                base_debit: None,
                base_credit: None,
                description: format!("Debit note {}", note.note_number),
            }),
        })
    }

    fn plan_payment_voucher(
        pv: &PaymentVoucher,
        accounts: &PaymentAccounts,
    ) -> Result<PostingPlan, FinanceError> {
        if !Money::is_positive(pv.allocated_amount) {
            return Err(FinanceError::NoAllocationTarget(pv.id));
        }

        let lines = LineSetBuilder::new()
            .debit(
                accounts.payable(),
                pv.amount,
                format!("Payment {}", pv.voucher_number),
            )
            .credit(
                accounts.cash(),
                pv.amount,
                format!("Payment {}", pv.voucher_number),
            );

        // Payable rows for payments are recorded per allocation.
        Ok(PostingPlan {
            lines,
            description: format!("Payment voucher {}", pv.voucher_number),
            document_rate: pv.exchange_rate,
            payable_entry: None,
        })
    }

    fn plan_sales_invoice(
        inv: &SalesInvoice,
        accounts: &SalesInvoiceAccounts,
    ) -> Result<PostingPlan, FinanceError> {
        let Some(first_line) = inv.lines.first() else {
            return Err(FinanceError::MissingLineItems(inv.document_ref()));
        };

        let mut lines = LineSetBuilder::new()
            .debit(
                accounts.receivable(),
                inv.total_amount,
                format!("Receivable for {}", inv.invoice_number),
            )
            .debit(first_line.account_id, inv.discount_amount, "Discount");

        for line in &inv.lines {
            lines = lines.credit_with_cost_center(
                line.account_id,
                line.line_total,
                line.description.clone(),
                line.cost_center_id,
            );
        }

        if Money::is_positive(inv.tax_amount) {
            let output_tax = accounts.output_tax().ok_or_else(|| {
                FinanceError::InvalidAccountMapping(format!(
                    "{} has output tax {} but no output tax account",
                    inv.document_ref(),
                    inv.tax_amount
                ))
            })?;
            lines = lines.credit(output_tax, inv.tax_amount, "Output tax");
        }

        Ok(PostingPlan {
            lines,
            description: format!("Sales invoice {}", inv.invoice_number),
            document_rate: inv.exchange_rate,
            payable_entry: None,
        })
    }
}

struct PostingPlan {
    lines: LineSetBuilder,
    description: String,
    document_rate: Decimal,
    payable_entry: Option<PayableEntry>,
}
