//! Source document types.

use chrono::{DateTime, NaiveDate, Utc};
use folio_shared::types::{
    AccountId, CompanyId, CostCenterId, CurrencyCode, CustomerId, DebitNoteId, JournalEntryId,
    Money, PaymentVoucherId, SalesInvoiceId, SupplierId, SupplierInvoiceId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::status::{DocumentKind, DocumentRef, DocumentStatus, StatusNote, Statusable};
use crate::error::FinanceError;

/// General ledger posting fields carried by every source document.
///
/// `journal_entry_id` is set exactly once; `is_posted_to_gl` only moves
/// from false to true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingState {
    /// Journal entry created for the document.
    pub journal_entry_id: Option<JournalEntryId>,
    /// True once the document has been posted.
    pub is_posted_to_gl: bool,
    /// When the document was posted.
    pub posted_to_gl_at: Option<DateTime<Utc>>,
}

impl PostingState {
    /// Records the posting.
    pub fn mark_posted(&mut self, journal_entry_id: JournalEntryId, at: DateTime<Utc>) {
        self.journal_entry_id = Some(journal_entry_id);
        self.is_posted_to_gl = true;
        self.posted_to_gl_at = Some(at);
    }
}

/// A line item on a supplier or sales invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Expense account (supplier invoice) or revenue account (sales invoice).
    pub account_id: AccountId,
    /// Line description.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit price.
    pub unit_price: Decimal,
    /// Line total, the amount posted.
    pub line_total: Decimal,
    /// Optional cost center.
    pub cost_center_id: Option<CostCenterId>,
}

/// Hold flags on a payment voucher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldState {
    /// True while the voucher is held.
    pub is_on_hold: bool,
    /// Reason given when the hold was placed.
    pub hold_reason: Option<String>,
    /// Who placed the hold.
    pub held_by: Option<UserId>,
    /// When the hold was placed.
    pub held_at: Option<DateTime<Utc>>,
}

/// Bill received from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierInvoice {
    /// Unique identifier.
    pub id: SupplierInvoiceId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Supplier the invoice is owed to.
    pub supplier_id: SupplierId,
    /// Invoice number.
    pub invoice_number: String,
    /// Invoice date, used for posting and FIFO ordering.
    pub invoice_date: NaiveDate,
    /// Payment due date.
    pub due_date: Option<NaiveDate>,
    /// Document currency.
    pub currency: CurrencyCode,
    /// Rate to the base currency.
    pub exchange_rate: Decimal,
    /// Sum of line totals.
    pub subtotal: Decimal,
    /// Tax amount.
    pub tax_amount: Decimal,
    /// True if the tax can be reclaimed as input tax.
    pub tax_recoverable: bool,
    /// Discount amount.
    pub discount_amount: Decimal,
    /// Total owed.
    pub total_amount: Decimal,
    /// Amount settled so far.
    pub paid_amount: Decimal,
    /// `total_amount - paid_amount`.
    pub outstanding_amount: Decimal,
    /// Lifecycle status.
    pub status: DocumentStatus,
    /// Line items.
    pub lines: Vec<InvoiceLine>,
    /// Posting fields.
    pub posting: PostingState,
}

/// Credit received from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitNote {
    /// Unique identifier.
    pub id: DebitNoteId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Supplier issuing the credit.
    pub supplier_id: SupplierId,
    /// Invoice the note is applied against.
    pub supplier_invoice_id: Option<SupplierInvoiceId>,
    /// Note number.
    pub note_number: String,
    /// Note date.
    pub note_date: NaiveDate,
    /// Document currency.
    pub currency: CurrencyCode,
    /// Rate to the base currency.
    pub exchange_rate: Decimal,
    /// Why the note was issued.
    pub reason: Option<String>,
    /// Note amount.
    pub total_amount: Decimal,
    /// Amount applied so far.
    pub paid_amount: Decimal,
    /// `total_amount - paid_amount`.
    pub outstanding_amount: Decimal,
    /// Lifecycle status.
    pub status: DocumentStatus,
    /// Posting fields.
    pub posting: PostingState,
}

/// Outgoing payment to a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVoucher {
    /// Unique identifier.
    pub id: PaymentVoucherId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Supplier being paid.
    pub supplier_id: SupplierId,
    /// Voucher number.
    pub voucher_number: String,
    /// Payment date.
    pub payment_date: NaiveDate,
    /// Payment currency.
    pub currency: CurrencyCode,
    /// Rate to the base currency.
    pub exchange_rate: Decimal,
    /// Payment amount.
    pub amount: Decimal,
    /// Sum of all allocations.
    pub allocated_amount: Decimal,
    /// `amount - allocated_amount`, never negative.
    pub unallocated_amount: Decimal,
    /// Lifecycle status.
    pub status: DocumentStatus,
    /// Hold flags.
    pub hold: HoldState,
    /// Posting fields.
    pub posting: PostingState,
}

/// Bill issued to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesInvoice {
    /// Unique identifier.
    pub id: SalesInvoiceId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Customer billed.
    pub customer_id: CustomerId,
    /// Invoice number.
    pub invoice_number: String,
    /// Invoice date.
    pub invoice_date: NaiveDate,
    /// Payment due date.
    pub due_date: Option<NaiveDate>,
    /// Document currency.
    pub currency: CurrencyCode,
    /// Rate to the base currency.
    pub exchange_rate: Decimal,
    /// Sum of line totals.
    pub subtotal: Decimal,
    /// Output tax amount.
    pub tax_amount: Decimal,
    /// Discount amount.
    pub discount_amount: Decimal,
    /// Total receivable.
    pub total_amount: Decimal,
    /// Amount received so far.
    pub paid_amount: Decimal,
    /// `total_amount - paid_amount`.
    pub outstanding_amount: Decimal,
    /// Lifecycle status.
    pub status: DocumentStatus,
    /// Line items.
    pub lines: Vec<InvoiceLine>,
    /// Posting fields.
    pub posting: PostingState,
}

/// Status a settled document should be in, if it needs to move.
///
/// `outstanding <= 0` means paid; otherwise any payment means partially paid.
#[must_use]
pub fn settlement_status(paid: Decimal, outstanding: Decimal) -> Option<DocumentStatus> {
    if Money::is_settled(outstanding) {
        Some(DocumentStatus::Paid)
    } else if Money::is_positive(paid) {
        Some(DocumentStatus::PartiallyPaid)
    } else {
        None
    }
}

/// Moves a document to its settlement status when it differs from the current one.
pub(crate) fn advance_settlement<T: Statusable>(
    doc: &mut T,
    paid: Decimal,
    outstanding: Decimal,
    note: &str,
) -> Result<Option<StatusNote>, FinanceError> {
    match settlement_status(paid, outstanding) {
        Some(target) if target != doc.current_status() => {
            doc.transition(target, Some(note.to_string())).map(Some)
        }
        _ => Ok(None),
    }
}

impl SupplierInvoice {
    /// Recomputes `outstanding_amount` from total and paid.
    pub fn recompute_outstanding(&mut self) {
        self.outstanding_amount = Money::sub(self.total_amount, self.paid_amount);
    }

    /// Applies a settlement (allocation or debit note) and advances the status.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the status cannot advance.
    pub fn apply_settlement(
        &mut self,
        amount: Decimal,
        note: &str,
    ) -> Result<Option<StatusNote>, FinanceError> {
        self.paid_amount = Money::add(self.paid_amount, amount);
        self.recompute_outstanding();
        let (paid, outstanding) = (self.paid_amount, self.outstanding_amount);
        advance_settlement(self, paid, outstanding, note)
    }

    /// Returns true if the invoice can receive settlements.
    #[must_use]
    pub fn accepts_settlement(&self) -> bool {
        matches!(
            self.status,
            DocumentStatus::Approved | DocumentStatus::PartiallyPaid
        ) && !Money::is_settled(self.outstanding_amount)
    }
}

impl PaymentVoucher {
    /// Recomputes allocated and unallocated amounts from the allocation total.
    pub fn set_allocated(&mut self, allocated: Decimal) {
        self.allocated_amount = Money::round(allocated);
        self.unallocated_amount = Money::sub(self.amount, self.allocated_amount);
    }
}

macro_rules! impl_statusable {
    ($ty:ty, $kind:expr, $number:ident, |$from:ident, $to:ident| $allowed:expr) => {
        impl Statusable for $ty {
            fn document_ref(&self) -> DocumentRef {
                DocumentRef {
                    kind: $kind,
                    id: self.id.into_inner(),
                    number: self.$number.clone(),
                }
            }

            fn current_status(&self) -> DocumentStatus {
                self.status
            }

            #[allow(clippy::enum_glob_use)]
            fn allows_transition($from: DocumentStatus, $to: DocumentStatus) -> bool {
                use DocumentStatus::*;
                $allowed
            }

            fn set_status(&mut self, status: DocumentStatus) {
                self.status = status;
            }
        }
    };
}

impl_statusable!(
    SupplierInvoice,
    DocumentKind::SupplierInvoice,
    invoice_number,
    |from, to| matches!(
        (from, to),
        (Draft, Submitted)
            | (Submitted, Draft | Approved)
            | (Approved, PartiallyPaid | Paid)
            | (PartiallyPaid, Paid)
            | (Draft | Submitted | Approved, Cancelled)
            | (Approved | PartiallyPaid | Paid, Voided)
    )
);

impl_statusable!(
    SalesInvoice,
    DocumentKind::SalesInvoice,
    invoice_number,
    |from, to| matches!(
        (from, to),
        (Draft, Submitted)
            | (Submitted, Draft | Approved)
            | (Approved, PartiallyPaid | Paid)
            | (PartiallyPaid, Paid)
            | (Draft | Submitted | Approved, Cancelled)
            | (Approved | PartiallyPaid | Paid, Voided)
    )
);

impl_statusable!(
    DebitNote,
    DocumentKind::DebitNote,
    note_number,
    |from, to| matches!(
        (from, to),
        (Draft, Submitted)
            | (Submitted, Draft | Approved)
            | (Approved, Paid)
            | (Draft | Submitted | Approved, Cancelled)
            | (Paid, Voided)
    )
);

impl_statusable!(
    PaymentVoucher,
    DocumentKind::PaymentVoucher,
    voucher_number,
    |from, to| matches!(
        (from, to),
        (Draft, Submitted)
            | (Submitted, Approved)
            | (Approved, Paid)
            | (Draft | Submitted | Approved, Cancelled)
            | (Paid, Voided)
    )
);

/// A document the posting engine accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceDocument {
    /// Supplier invoice.
    SupplierInvoice(SupplierInvoice),
    /// Debit note.
    DebitNote(DebitNote),
    /// Payment voucher.
    PaymentVoucher(PaymentVoucher),
    /// Sales invoice.
    SalesInvoice(SalesInvoice),
}

impl SourceDocument {
    /// Returns the document kind.
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::SupplierInvoice(_) => DocumentKind::SupplierInvoice,
            Self::DebitNote(_) => DocumentKind::DebitNote,
            Self::PaymentVoucher(_) => DocumentKind::PaymentVoucher,
            Self::SalesInvoice(_) => DocumentKind::SalesInvoice,
        }
    }

    /// Returns the document reference.
    #[must_use]
    pub fn document_ref(&self) -> DocumentRef {
        match self {
            Self::SupplierInvoice(d) => d.document_ref(),
            Self::DebitNote(d) => d.document_ref(),
            Self::PaymentVoucher(d) => d.document_ref(),
            Self::SalesInvoice(d) => d.document_ref(),
        }
    }

    /// Returns the owning company.
    #[must_use]
    pub fn company_id(&self) -> CompanyId {
        match self {
            Self::SupplierInvoice(d) => d.company_id,
            Self::DebitNote(d) => d.company_id,
            Self::PaymentVoucher(d) => d.company_id,
            Self::SalesInvoice(d) => d.company_id,
        }
    }

    /// Returns the date the document posts on.
    #[must_use]
    pub fn document_date(&self) -> NaiveDate {
        match self {
            Self::SupplierInvoice(d) => d.invoice_date,
            Self::DebitNote(d) => d.note_date,
            Self::PaymentVoucher(d) => d.payment_date,
            Self::SalesInvoice(d) => d.invoice_date,
        }
    }

    /// Returns the document currency.
    #[must_use]
    pub fn currency(&self) -> &CurrencyCode {
        match self {
            Self::SupplierInvoice(d) => &d.currency,
            Self::DebitNote(d) => &d.currency,
            Self::PaymentVoucher(d) => &d.currency,
            Self::SalesInvoice(d) => &d.currency,
        }
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> DocumentStatus {
        match self {
            Self::SupplierInvoice(d) => d.status,
            Self::DebitNote(d) => d.status,
            Self::PaymentVoucher(d) => d.status,
            Self::SalesInvoice(d) => d.status,
        }
    }

    /// Returns the posting fields.
    #[must_use]
    pub fn posting(&self) -> &PostingState {
        match self {
            Self::SupplierInvoice(d) => &d.posting,
            Self::DebitNote(d) => &d.posting,
            Self::PaymentVoucher(d) => &d.posting,
            Self::SalesInvoice(d) => &d.posting,
        }
    }

    /// Returns the posting fields mutably.
    pub fn posting_mut(&mut self) -> &mut PostingState {
        match self {
            Self::SupplierInvoice(d) => &mut d.posting,
            Self::DebitNote(d) => &mut d.posting,
            Self::PaymentVoucher(d) => &mut d.posting,
            Self::SalesInvoice(d) => &mut d.posting,
        }
    }

    /// Status the document must be in before it can be posted.
    #[must_use]
    pub fn required_posting_status(&self) -> DocumentStatus {
        match self {
            Self::PaymentVoucher(_) => DocumentStatus::Paid,
            Self::SupplierInvoice(_) | Self::DebitNote(_) | Self::SalesInvoice(_) => {
                DocumentStatus::Approved
            }
        }
    }

    /// Checks that `to` may be set by a direct status change.
    ///
    /// Partially paid and paid follow from settlement for supplier invoices
    /// and debit notes, and a voucher is paid only through its workflow.
    /// Sales invoices have no receipt flow, so every status stays open to them.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` naming the route that sets `to`.
    pub fn ensure_direct_transition(&self, to: DocumentStatus) -> Result<(), FinanceError> {
        let reserved = match self {
            Self::SupplierInvoice(_) | Self::DebitNote(_) => {
                matches!(to, DocumentStatus::PartiallyPaid | DocumentStatus::Paid)
                    .then_some("set by settlement of the outstanding amount")
            }
            Self::PaymentVoucher(_) => {
                (to == DocumentStatus::Paid).then_some("set by the voucher payment workflow")
            }
            Self::SalesInvoice(_) => None,
        };
        match reserved {
            Some(route) => Err(FinanceError::invalid_state(
                &self.document_ref(),
                self.status(),
                format!("{to} is {route}"),
            )),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Document builders shared by tests across the crate.

    use super::*;
    use rust_decimal_macros::dec;

    pub fn usd() -> CurrencyCode {
        CurrencyCode::parse("USD").unwrap()
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn line(account_id: AccountId, amount: Decimal) -> InvoiceLine {
        InvoiceLine {
            account_id,
            description: "Office supplies".into(),
            quantity: dec!(1),
            unit_price: amount,
            line_total: amount,
            cost_center_id: None,
        }
    }

    pub fn supplier_invoice(
        company_id: CompanyId,
        supplier_id: SupplierId,
        number: &str,
        invoice_date: NaiveDate,
        total: Decimal,
    ) -> SupplierInvoice {
        SupplierInvoice {
            id: SupplierInvoiceId::new(),
            company_id,
            supplier_id,
            invoice_number: number.into(),
            invoice_date,
            due_date: None,
            currency: usd(),
            exchange_rate: Decimal::ONE,
            subtotal: total,
            tax_amount: Decimal::ZERO,
            tax_recoverable: false,
            discount_amount: Decimal::ZERO,
            total_amount: total,
            paid_amount: Decimal::ZERO,
            outstanding_amount: total,
            status: DocumentStatus::Approved,
            lines: vec![line(AccountId::new(), total)],
            posting: PostingState::default(),
        }
    }

    pub fn debit_note(
        company_id: CompanyId,
        supplier_id: SupplierId,
        supplier_invoice_id: Option<SupplierInvoiceId>,
        amount: Decimal,
    ) -> DebitNote {
        DebitNote {
            id: DebitNoteId::new(),
            company_id,
            supplier_id,
            supplier_invoice_id,
            note_number: "DN-0001".into(),
            note_date: date(2024, 4, 10),
            currency: usd(),
            exchange_rate: Decimal::ONE,
            reason: Some("Damaged goods".into()),
            total_amount: amount,
            paid_amount: Decimal::ZERO,
            outstanding_amount: amount,
            status: DocumentStatus::Approved,
            posting: PostingState::default(),
        }
    }

    pub fn payment_voucher(
        company_id: CompanyId,
        supplier_id: SupplierId,
        amount: Decimal,
    ) -> PaymentVoucher {
        PaymentVoucher {
            id: PaymentVoucherId::new(),
            company_id,
            supplier_id,
            voucher_number: "PV-0001".into(),
            payment_date: date(2024, 4, 15),
            currency: usd(),
            exchange_rate: Decimal::ONE,
            amount,
            allocated_amount: Decimal::ZERO,
            unallocated_amount: amount,
            status: DocumentStatus::Approved,
            hold: HoldState::default(),
            posting: PostingState::default(),
        }
    }

    pub fn sales_invoice(company_id: CompanyId, total: Decimal) -> SalesInvoice {
        SalesInvoice {
            id: SalesInvoiceId::new(),
            company_id,
            customer_id: CustomerId::new(),
            invoice_number: "INV-0001".into(),
            invoice_date: date(2024, 4, 5),
            due_date: None,
            currency: usd(),
            exchange_rate: Decimal::ONE,
            subtotal: total,
            tax_amount: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            total_amount: total,
            paid_amount: Decimal::ZERO,
            outstanding_amount: total,
            status: DocumentStatus::Approved,
            lines: vec![line(AccountId::new(), total)],
            posting: PostingState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0), dec!(1000), None)]
    #[case(dec!(500), dec!(500), Some(DocumentStatus::PartiallyPaid))]
    #[case(dec!(1000), dec!(0), Some(DocumentStatus::Paid))]
    #[case(dec!(1200), dec!(-200), Some(DocumentStatus::Paid))]
    fn test_settlement_status(
        #[case] paid: Decimal,
        #[case] outstanding: Decimal,
        #[case] expected: Option<DocumentStatus>,
    ) {
        assert_eq!(settlement_status(paid, outstanding), expected);
    }

    #[test]
    fn test_apply_settlement_partial_then_full() {
        let mut inv = supplier_invoice(
            CompanyId::new(),
            SupplierId::new(),
            "SI-1",
            date(2024, 1, 1),
            dec!(1000),
        );

        let note = inv.apply_settlement(dec!(400), "allocated").unwrap().unwrap();
        assert_eq!(inv.paid_amount, dec!(400));
        assert_eq!(inv.outstanding_amount, dec!(600));
        assert_eq!(note.from, DocumentStatus::Approved);
        assert_eq!(note.to, DocumentStatus::PartiallyPaid);

        // Staying partially paid records no transition
        assert!(inv.apply_settlement(dec!(100), "allocated").unwrap().is_none());

        let note = inv.apply_settlement(dec!(500), "allocated").unwrap().unwrap();
        assert_eq!(inv.outstanding_amount, dec!(0));
        assert_eq!(note.to, DocumentStatus::Paid);
        assert!(!inv.accepts_settlement());
    }

    #[test]
    fn test_invoice_transitions() {
        let mut inv = supplier_invoice(
            CompanyId::new(),
            SupplierId::new(),
            "SI-2",
            date(2024, 1, 1),
            dec!(10),
        );
        inv.status = DocumentStatus::Draft;

        let note = inv
            .transition(DocumentStatus::Submitted, Some("ready".into()))
            .unwrap();
        assert_eq!(note.document.kind, DocumentKind::SupplierInvoice);
        assert_eq!(note.note.as_deref(), Some("ready"));

        let err = inv.transition(DocumentStatus::Paid, None).unwrap_err();
        assert!(matches!(err, FinanceError::InvalidState { .. }));
        assert_eq!(inv.status, DocumentStatus::Submitted);
    }

    #[test]
    fn test_voucher_lifecycle() {
        let mut pv = payment_voucher(CompanyId::new(), SupplierId::new(), dec!(100));
        pv.status = DocumentStatus::Draft;

        pv.transition(DocumentStatus::Submitted, None).unwrap();
        pv.transition(DocumentStatus::Approved, None).unwrap();
        pv.transition(DocumentStatus::Paid, None).unwrap();
        assert!(pv.transition(DocumentStatus::Cancelled, None).is_err());
        pv.transition(DocumentStatus::Voided, None).unwrap();
        assert!(pv.transition(DocumentStatus::Paid, None).is_err());
    }

    #[rstest]
    #[case(DocumentStatus::Draft)]
    #[case(DocumentStatus::Submitted)]
    #[case(DocumentStatus::Approved)]
    fn test_voucher_cancellable_before_payment(#[case] status: DocumentStatus) {
        assert!(PaymentVoucher::allows_transition(
            status,
            DocumentStatus::Cancelled
        ));
    }

    #[test]
    fn test_debit_note_transitions() {
        assert!(DebitNote::allows_transition(
            DocumentStatus::Approved,
            DocumentStatus::Paid
        ));
        assert!(!DebitNote::allows_transition(
            DocumentStatus::Approved,
            DocumentStatus::PartiallyPaid
        ));
    }

    #[test]
    fn test_voucher_set_allocated() {
        let mut pv = payment_voucher(CompanyId::new(), SupplierId::new(), dec!(3000));
        pv.set_allocated(dec!(2500));
        assert_eq!(pv.allocated_amount, dec!(2500));
        assert_eq!(pv.unallocated_amount, dec!(500));
    }

    #[test]
    fn test_source_document_accessors() {
        let company = CompanyId::new();
        let mut doc = SourceDocument::DebitNote(debit_note(company, SupplierId::new(), None, dec!(50)));
        assert_eq!(doc.kind(), DocumentKind::DebitNote);
        assert_eq!(doc.company_id(), company);
        assert_eq!(doc.required_posting_status(), DocumentStatus::Approved);
        assert!(!doc.posting().is_posted_to_gl);

        let entry_id = JournalEntryId::new();
        doc.posting_mut().mark_posted(entry_id, Utc::now());
        assert_eq!(doc.posting().journal_entry_id, Some(entry_id));

        let pv = SourceDocument::PaymentVoucher(payment_voucher(company, SupplierId::new(), dec!(1)));
        assert_eq!(pv.required_posting_status(), DocumentStatus::Paid);
    }

    #[rstest]
    #[case(DocumentStatus::PartiallyPaid)]
    #[case(DocumentStatus::Paid)]
    fn test_settlement_statuses_are_not_set_directly(#[case] to: DocumentStatus) {
        let company = CompanyId::new();
        let invoice = SourceDocument::SupplierInvoice(supplier_invoice(
            company,
            SupplierId::new(),
            "SI-1",
            date(2024, 1, 5),
            dec!(500),
        ));
        assert!(matches!(
            invoice.ensure_direct_transition(to),
            Err(FinanceError::InvalidState { .. })
        ));

        let note = SourceDocument::DebitNote(debit_note(company, SupplierId::new(), None, dec!(50)));
        assert!(note.ensure_direct_transition(to).is_err());
    }

    #[test]
    fn test_direct_transitions_allowed_outside_settlement() {
        let company = CompanyId::new();
        let invoice = SourceDocument::SupplierInvoice(supplier_invoice(
            company,
            SupplierId::new(),
            "SI-2",
            date(2024, 1, 5),
            dec!(500),
        ));
        assert!(invoice.ensure_direct_transition(DocumentStatus::Cancelled).is_ok());
        assert!(invoice.ensure_direct_transition(DocumentStatus::Voided).is_ok());

        let pv = SourceDocument::PaymentVoucher(payment_voucher(company, SupplierId::new(), dec!(1)));
        assert!(pv.ensure_direct_transition(DocumentStatus::Paid).is_err());
        assert!(pv.ensure_direct_transition(DocumentStatus::Cancelled).is_ok());

        let sales = SourceDocument::SalesInvoice(sales_invoice(company, dec!(80)));
        assert!(sales.ensure_direct_transition(DocumentStatus::Paid).is_ok());
    }
}
