//! Source document storage and status history.
//!
//! Loaders take a `lock` flag: repositories that read-modify-write a
//! document inside a transaction load it with `SELECT ... FOR UPDATE`.

use chrono::{DateTime, Utc};
use folio_core::FinanceError;
use folio_core::currency::convert_to_base;
use folio_core::document::{
    DebitNote, DocumentKind, DocumentRef, DocumentStatus, PaymentVoucher, SalesInvoice, SourceDocument,
    StatusNote, Statusable, SupplierInvoice,
};
use folio_core::hold::HoldGate;
use folio_shared::types::{CurrencyCode, UserId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use super::convert::{self, db_err};
use crate::entities::{
    debit_notes, document_status_history, payment_vouchers, sales_invoice_lines, sales_invoices,
    supplier_invoice_lines, supplier_invoices,
};

/// One row of a document's status history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusHistoryRecord {
    /// The change.
    pub note: StatusNote,
    /// Who made it.
    pub actor: UserId,
    /// When it was recorded.
    pub at: DateTime<Utc>,
}

/// Repository for source documents.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    db: DatabaseConnection,
    base_currency: CurrencyCode,
}

impl DocumentRepository {
    /// Creates a new document repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, base_currency: CurrencyCode) -> Self {
        Self { db, base_currency }
    }

    /// Stores a new supplier invoice with its lines.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` if the invoice number is taken,
    /// `Database` for other storage failures.
    pub async fn create_supplier_invoice(
        &self,
        invoice: &SupplierInvoice,
    ) -> Result<(), FinanceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now();

        convert::supplier_invoice_active(invoice, now)
            .insert(&txn)
            .await
            .map_err(db_err)?;
        for line in convert::supplier_invoice_lines_active(invoice) {
            line.insert(&txn).await.map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        tracing::debug!(invoice_id = %invoice.id, number = %invoice.invoice_number, "supplier invoice stored");
        Ok(())
    }

    /// Stores a new sales invoice with its lines.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` if the invoice number is taken,
    /// `Database` for other storage failures.
    pub async fn create_sales_invoice(&self, invoice: &SalesInvoice) -> Result<(), FinanceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now();

        convert::sales_invoice_active(invoice, now)
            .insert(&txn)
            .await
            .map_err(db_err)?;
        for line in convert::sales_invoice_lines_active(invoice) {
            line.insert(&txn).await.map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        tracing::debug!(invoice_id = %invoice.id, number = %invoice.invoice_number, "sales invoice stored");
        Ok(())
    }

    /// Stores a new debit note.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` if the note number is taken,
    /// `Database` for other storage failures.
    pub async fn create_debit_note(&self, note: &DebitNote) -> Result<(), FinanceError> {
        convert::debit_note_active(note, Utc::now())
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        tracing::debug!(note_id = %note.id, number = %note.note_number, "debit note stored");
        Ok(())
    }

    /// Stores a new payment voucher, deriving its base currency amount.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a non-positive amount or allocated and
    /// unallocated amounts that do not add up, `ConcurrentModification` if
    /// the voucher number is taken, `Database` for other storage failures.
    pub async fn create_payment_voucher(&self, voucher: &PaymentVoucher) -> Result<(), FinanceError> {
        if voucher.amount <= Decimal::ZERO {
            return Err(FinanceError::InvalidInput(format!(
                "payment voucher amount must be positive, got {}",
                voucher.amount
            )));
        }
        if voucher.allocated_amount + voucher.unallocated_amount != voucher.amount {
            return Err(FinanceError::InvalidInput(format!(
                "allocated {} and unallocated {} must add up to {}",
                voucher.allocated_amount, voucher.unallocated_amount, voucher.amount
            )));
        }

        let base_amount = voucher_base_amount(voucher, &self.base_currency);
        convert::payment_voucher_active(voucher, base_amount, Utc::now())
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        tracing::debug!(voucher_id = %voucher.id, number = %voucher.voucher_number, "payment voucher stored");
        Ok(())
    }

    /// Loads any source document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such document.
    pub async fn find(&self, kind: DocumentKind, id: Uuid) -> Result<SourceDocument, FinanceError> {
        load_source_document(&self.db, kind, id, false).await
    }

    /// Moves a document to a new lifecycle status and records the change.
    ///
    /// Partially paid and paid come from settlement for supplier invoices and
    /// debit notes, and a voucher is paid through [`VoucherRepository::mark_paid`],
    /// so neither can be set here. Vouchers on hold cannot be approved.
    ///
    /// [`VoucherRepository::mark_paid`]: super::VoucherRepository::mark_paid
    ///
    /// # Errors
    ///
    /// - `NotFound` if there is no such document
    /// - `VoucherOnHold` when approving a held voucher
    /// - `InvalidState` for a settlement status, or a transition the document
    ///   type does not allow
    pub async fn transition(
        &self,
        kind: DocumentKind,
        id: Uuid,
        to: DocumentStatus,
        note: Option<String>,
        actor: UserId,
    ) -> Result<SourceDocument, FinanceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now();

        let mut document = load_source_document(&txn, kind, id, true).await?;
        document.ensure_direct_transition(to)?;
        let change = match &mut document {
            SourceDocument::SupplierInvoice(d) => d.transition(to, note),
            SourceDocument::DebitNote(d) => d.transition(to, note),
            SourceDocument::SalesInvoice(d) => d.transition(to, note),
            SourceDocument::PaymentVoucher(d) => {
                if to == DocumentStatus::Approved {
                    HoldGate::ensure_not_held(d)?;
                }
                d.transition(to, note)
            }
        }?;

        save_source_document(&txn, &document, None, now).await?;
        append_history(&txn, std::slice::from_ref(&change), actor, now).await?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            document = %change.document,
            from = %change.from,
            to = %change.to,
            actor = %actor,
            "document status changed"
        );
        Ok(document)
    }

    /// Latest status recorded in the document's history.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the query fails.
    pub async fn latest_status(
        &self,
        kind: DocumentKind,
        id: Uuid,
    ) -> Result<Option<DocumentStatus>, FinanceError> {
        let latest = document_status_history::Entity::find()
            .filter(document_status_history::Column::DocumentKind.eq(convert::document_kind_to_db(kind)))
            .filter(document_status_history::Column::DocumentId.eq(id))
            .order_by_desc(document_status_history::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(latest.map(|row| convert::document_status_to_core(row.to_status)))
    }

    /// Full status history of a document, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the query fails.
    pub async fn status_history(
        &self,
        kind: DocumentKind,
        id: Uuid,
    ) -> Result<Vec<StatusHistoryRecord>, FinanceError> {
        let rows = document_status_history::Entity::find()
            .filter(document_status_history::Column::DocumentKind.eq(convert::document_kind_to_db(kind)))
            .filter(document_status_history::Column::DocumentId.eq(id))
            .order_by_asc(document_status_history::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| StatusHistoryRecord {
                note: StatusNote {
                    document: DocumentRef {
                        kind: convert::document_kind_to_core(row.document_kind),
                        id: row.document_id,
                        number: row.document_number,
                    },
                    from: convert::document_status_to_core(row.from_status),
                    to: convert::document_status_to_core(row.to_status),
                    note: row.note,
                },
                actor: UserId::from_uuid(row.actor),
                at: convert::utc(row.created_at),
            })
            .collect())
    }
}

/// Voucher amount in the base currency.
///
/// The rate is 1 when the voucher is already in the base currency.
pub(crate) fn voucher_base_amount(voucher: &PaymentVoucher, base: &CurrencyCode) -> Decimal {
    if &voucher.currency == base {
        voucher.amount
    } else {
        convert_to_base(voucher.amount, voucher.exchange_rate)
    }
}

// ===== Loaders

pub(crate) async fn load_supplier_invoice<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    lock: bool,
) -> Result<Option<SupplierInvoice>, FinanceError> {
    let mut query = supplier_invoices::Entity::find_by_id(id);
    if lock {
        query = query.lock_exclusive();
    }
    let Some(model) = query.one(conn).await.map_err(db_err)? else {
        return Ok(None);
    };
    let lines = supplier_invoice_lines::Entity::find()
        .filter(supplier_invoice_lines::Column::SupplierInvoiceId.eq(id))
        .order_by_asc(supplier_invoice_lines::Column::LineNumber)
        .all(conn)
        .await
        .map_err(db_err)?;
    convert::supplier_invoice(model, lines).map(Some)
}

/// Loads and locks invoices in ascending id order.
pub(crate) async fn lock_supplier_invoices<C: ConnectionTrait>(
    conn: &C,
    mut ids: Vec<Uuid>,
) -> Result<Vec<SupplierInvoice>, FinanceError> {
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let models = supplier_invoices::Entity::find()
        .filter(supplier_invoices::Column::Id.is_in(ids.clone()))
        .order_by_asc(supplier_invoices::Column::Id)
        .lock_exclusive()
        .all(conn)
        .await
        .map_err(db_err)?;
    let mut lines = supplier_invoice_lines::Entity::find()
        .filter(supplier_invoice_lines::Column::SupplierInvoiceId.is_in(ids))
        .order_by_asc(supplier_invoice_lines::Column::LineNumber)
        .all(conn)
        .await
        .map_err(db_err)?;

    models
        .into_iter()
        .map(|model| {
            let (own, rest): (Vec<_>, Vec<_>) = lines
                .drain(..)
                .partition(|l| l.supplier_invoice_id == model.id);
            lines = rest;
            convert::supplier_invoice(model, own)
        })
        .collect()
}

pub(crate) async fn load_sales_invoice<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    lock: bool,
) -> Result<Option<SalesInvoice>, FinanceError> {
    let mut query = sales_invoices::Entity::find_by_id(id);
    if lock {
        query = query.lock_exclusive();
    }
    let Some(model) = query.one(conn).await.map_err(db_err)? else {
        return Ok(None);
    };
    let lines = sales_invoice_lines::Entity::find()
        .filter(sales_invoice_lines::Column::SalesInvoiceId.eq(id))
        .order_by_asc(sales_invoice_lines::Column::LineNumber)
        .all(conn)
        .await
        .map_err(db_err)?;
    convert::sales_invoice(model, lines).map(Some)
}

pub(crate) async fn load_debit_note<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    lock: bool,
) -> Result<Option<DebitNote>, FinanceError> {
    let mut query = debit_notes::Entity::find_by_id(id);
    if lock {
        query = query.lock_exclusive();
    }
    query
        .one(conn)
        .await
        .map_err(db_err)?
        .map(convert::debit_note)
        .transpose()
}

pub(crate) async fn load_payment_voucher<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    lock: bool,
) -> Result<Option<PaymentVoucher>, FinanceError> {
    let mut query = payment_vouchers::Entity::find_by_id(id);
    if lock {
        query = query.lock_exclusive();
    }
    query
        .one(conn)
        .await
        .map_err(db_err)?
        .map(convert::payment_voucher)
        .transpose()
}

pub(crate) async fn load_source_document<C: ConnectionTrait>(
    conn: &C,
    kind: DocumentKind,
    id: Uuid,
    lock: bool,
) -> Result<SourceDocument, FinanceError> {
    let document = match kind {
        DocumentKind::SupplierInvoice => load_supplier_invoice(conn, id, lock)
            .await?
            .map(SourceDocument::SupplierInvoice),
        DocumentKind::DebitNote => load_debit_note(conn, id, lock)
            .await?
            .map(SourceDocument::DebitNote),
        DocumentKind::PaymentVoucher => load_payment_voucher(conn, id, lock)
            .await?
            .map(SourceDocument::PaymentVoucher),
        DocumentKind::SalesInvoice => load_sales_invoice(conn, id, lock)
            .await?
            .map(SourceDocument::SalesInvoice),
    };
    document.ok_or_else(|| FinanceError::NotFound(format!("{kind} {id}")))
}

// ===== Writers

/// Writes the mutable fields of a document back to its row.
///
/// `voucher_base_amount` is written for payment vouchers when given.
pub(crate) async fn save_source_document<C: ConnectionTrait>(
    conn: &C,
    document: &SourceDocument,
    voucher_base_amount: Option<Decimal>,
    now: DateTime<Utc>,
) -> Result<(), FinanceError> {
    match document {
        SourceDocument::SupplierInvoice(d) => {
            convert::supplier_invoice_update(d, now).update(conn).await.map_err(db_err)?;
        }
        SourceDocument::DebitNote(d) => {
            convert::debit_note_update(d, now).update(conn).await.map_err(db_err)?;
        }
        SourceDocument::PaymentVoucher(d) => {
            convert::payment_voucher_update(d, voucher_base_amount, now)
                .update(conn)
                .await
                .map_err(db_err)?;
        }
        SourceDocument::SalesInvoice(d) => {
            convert::sales_invoice_update(d, now).update(conn).await.map_err(db_err)?;
        }
    }
    Ok(())
}

/// Appends status changes to the history table.
pub(crate) async fn append_history<C: ConnectionTrait>(
    conn: &C,
    notes: &[StatusNote],
    actor: UserId,
    at: DateTime<Utc>,
) -> Result<(), FinanceError> {
    for note in notes {
        convert::status_history_active(note, actor, at)
            .insert(conn)
            .await
            .map_err(db_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use folio_core::document::{HoldState, PostingState};
    use folio_shared::types::{CompanyId, PaymentVoucherId, SupplierId};
    use rust_decimal_macros::dec;

    fn voucher(currency: &str, rate: Decimal) -> PaymentVoucher {
        PaymentVoucher {
            id: PaymentVoucherId::new(),
            company_id: CompanyId::new(),
            supplier_id: SupplierId::new(),
            voucher_number: "PV-0001".into(),
            payment_date: NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
            currency: CurrencyCode::parse(currency).unwrap(),
            exchange_rate: rate,
            amount: dec!(250.50),
            allocated_amount: Decimal::ZERO,
            unallocated_amount: dec!(250.50),
            status: DocumentStatus::Draft,
            hold: HoldState::default(),
            posting: PostingState::default(),
        }
    }

    #[test]
    fn test_base_amount_ignores_rate_in_base_currency() {
        let usd = CurrencyCode::parse("USD").unwrap();
        assert_eq!(voucher_base_amount(&voucher("USD", dec!(1.3)), &usd), dec!(250.50));
    }

    #[test]
    fn test_base_amount_converts_foreign_voucher() {
        let usd = CurrencyCode::parse("USD").unwrap();
        assert_eq!(
            voucher_base_amount(&voucher("EUR", dec!(1.1)), &usd),
            dec!(275.55)
        );
    }
}
