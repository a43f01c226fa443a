//! Transactional posting and reversal of journal entries.
//!
//! Each call runs in one database transaction: the source document (and a
//! debit note's invoice) is locked, the core engine computes every write,
//! and the writes are applied before commit. Any error drops the
//! transaction, which rolls everything back.

use chrono::{NaiveDate, Utc};
use folio_core::FinanceError;
use folio_core::collab::{Authorizer, SequentialNumbering};
use folio_core::document::{DocumentKind, SourceDocument, SupplierInvoice};
use folio_core::journal::{
    AccountMapping, JournalEntry, PostingContext, PostingRequest, PostingService, ReferenceType,
    ReversalRequest, ReversalService,
};
use folio_core::payable::PayableLedgerRow;
use folio_shared::types::{CompanyId, CurrencyCode, JournalEntryId};
use sea_orm::ActiveValue::Unchanged;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use uuid::Uuid;

use super::convert::{self, db_err};
use super::document::{
    append_history, load_source_document, load_supplier_invoice, save_source_document,
    voucher_base_amount,
};
use super::fiscal::load_calendar;
use super::payable_ledger::record_entries;
use crate::entities::{journal_entries, journal_entry_lines};

/// Prefix of generated journal entry numbers.
const ENTRY_NUMBER_PREFIX: &str = "JE";

/// Result of a committed posting.
#[derive(Debug, Clone)]
pub struct PostedDocument {
    /// The posted journal entry.
    pub entry: JournalEntry,
    /// Source document as stored after posting.
    pub document: SourceDocument,
    /// Debit note's invoice as stored after posting.
    pub linked_invoice: Option<SupplierInvoice>,
    /// Payable ledger row written for supplier documents.
    pub ledger_row: Option<PayableLedgerRow>,
}

/// Result of a committed reversal.
#[derive(Debug, Clone)]
pub struct ReversedEntry {
    /// The new reversing entry.
    pub reversing_entry: JournalEntry,
    /// The original entry, now linked to its reversal.
    pub original: JournalEntry,
}

/// Posting repository.
#[derive(Debug, Clone)]
pub struct PostingRepository {
    db: DatabaseConnection,
    base_currency: CurrencyCode,
}

impl PostingRepository {
    /// Creates a new posting repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, base_currency: CurrencyCode) -> Self {
        Self { db, base_currency }
    }

    /// Posts a source document to the general ledger.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the document does not exist
    /// - any error of [`PostingService::post`]
    /// - `ConcurrentModification` if another transaction posted the same
    ///   document first
    pub async fn post(
        &self,
        kind: DocumentKind,
        document_id: Uuid,
        mapping: &AccountMapping,
        authorizer: &dyn Authorizer,
    ) -> Result<PostedDocument, FinanceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now();

        let document = load_source_document(&txn, kind, document_id, true).await?;
        let linked_invoice = match &document {
            SourceDocument::DebitNote(note) => match note.supplier_invoice_id {
                Some(invoice_id) => {
                    load_supplier_invoice(&txn, invoice_id.into_inner(), true).await?
                }
                None => None,
            },
            _ => None,
        };

        let company_id = document.company_id();
        let calendar = load_calendar(&txn, company_id).await?;
        let numbering = next_entry_numbering(&txn, company_id).await?;

        let outcome = PostingService::post(
            PostingRequest {
                document: &document,
                mapping,
                linked_invoice: linked_invoice.as_ref(),
            },
            PostingContext {
                calendar: &calendar,
                base_currency: &self.base_currency,
                numbering: &numbering,
                authorizer,
                now,
            },
        )
        .inspect_err(|err| {
            tracing::warn!(
                document = %document.document_ref(),
                error_code = err.error_code(),
                error = %err,
                "posting rejected"
            );
        })?;

        insert_entry(&txn, &outcome.entry).await?;

        let voucher_base = match &outcome.document {
            SourceDocument::PaymentVoucher(pv) => Some(voucher_base_amount(pv, &self.base_currency)),
            _ => None,
        };
        save_source_document(&txn, &outcome.document, voucher_base, now).await?;
        if let Some(invoice) = &outcome.linked_invoice {
            convert::supplier_invoice_update(invoice, now)
                .update(&txn)
                .await
                .map_err(db_err)?;
        }
        append_history(&txn, &outcome.status_notes, outcome.posted_by, now).await?;

        let ledger_row = record_entries(
            &txn,
            &self.base_currency,
            outcome.payable_entry.into_iter().collect(),
            now,
        )
        .await?
        .pop();

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            document = %outcome.document.document_ref(),
            journal_entry_id = %outcome.entry.id,
            entry_number = %outcome.entry.entry_number,
            total = %outcome.entry.total_debit,
            posted_by = %outcome.posted_by,
            "document posted"
        );

        Ok(PostedDocument {
            entry: outcome.entry,
            document: outcome.document,
            linked_invoice: outcome.linked_invoice,
            ledger_row,
        })
    }

    /// Reverses a posted journal entry into the period of `reversal_date`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the entry does not exist
    /// - any error of [`ReversalService::reverse`]
    pub async fn reverse(
        &self,
        entry_id: JournalEntryId,
        reversal_date: NaiveDate,
        reason: &str,
        authorizer: &dyn Authorizer,
    ) -> Result<ReversedEntry, FinanceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now();

        let original = load_entry(&txn, entry_id, true).await?;
        let calendar = load_calendar(&txn, original.company_id).await?;
        let numbering = next_entry_numbering(&txn, original.company_id).await?;

        let outcome = ReversalService::reverse(
            ReversalRequest {
                entry: &original,
                reversal_date,
                reason,
            },
            PostingContext {
                calendar: &calendar,
                base_currency: &self.base_currency,
                numbering: &numbering,
                authorizer,
                now,
            },
        )
        .inspect_err(|err| {
            tracing::warn!(
                journal_entry_id = %entry_id,
                error_code = err.error_code(),
                error = %err,
                "reversal rejected"
            );
        })?;

        insert_entry(&txn, &outcome.reversing_entry).await?;
        journal_entries::ActiveModel {
            id: Unchanged(entry_id.into_inner()),
            reversal_entry_id: Set(Some(outcome.reversing_entry.id.into_inner())),
            updated_at: Set(convert::tz(now)),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            journal_entry_id = %entry_id,
            reversal_entry_id = %outcome.reversing_entry.id,
            reversed_by = %outcome.reversed_by,
            "journal entry reversed"
        );

        Ok(ReversedEntry {
            reversing_entry: outcome.reversing_entry,
            original: outcome.original,
        })
    }

    /// Loads a journal entry with its lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the entry does not exist.
    pub async fn find_entry(&self, entry_id: JournalEntryId) -> Result<JournalEntry, FinanceError> {
        load_entry(&self.db, entry_id, false).await
    }

    /// Journal entries referencing a source document, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the query fails.
    pub async fn entries_for_document(
        &self,
        kind: DocumentKind,
        document_id: Uuid,
    ) -> Result<Vec<JournalEntry>, FinanceError> {
        let headers = journal_entries::Entity::find()
            .filter(journal_entries::Column::ReferenceType.eq(convert::reference_type_to_db(ReferenceType::from(kind))))
            .filter(journal_entries::Column::ReferenceId.eq(document_id))
            .order_by_asc(journal_entries::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut entries = Vec::with_capacity(headers.len());
        for header in headers {
            let lines = load_lines(&self.db, header.id).await?;
            entries.push(convert::journal_entry(header, lines)?);
        }
        Ok(entries)
    }
}

/// Reserves the company's next journal entry number.
///
/// The upsert holds the sequence row lock until the transaction ends, so
/// concurrent postings in one company queue here instead of drawing the
/// same number. A rolled-back posting gives its number back.
async fn next_entry_numbering<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
) -> Result<SequentialNumbering, FinanceError> {
    let stmt = Statement::from_sql_and_values(
        conn.get_database_backend(),
        "INSERT INTO journal_entry_sequences (company_id, last_number) VALUES ($1, 1) \
         ON CONFLICT (company_id) \
         DO UPDATE SET last_number = journal_entry_sequences.last_number + 1 \
         RETURNING last_number",
        [company_id.into_inner().into()],
    );
    let row = conn
        .query_one(stmt)
        .await
        .map_err(db_err)?
        .ok_or_else(|| FinanceError::Database("entry number was not reserved".to_string()))?;
    let reserved: i64 = row.try_get("", "last_number").map_err(db_err)?;
    let next = u64::try_from(reserved)
        .map_err(|_| FinanceError::Database(format!("invalid entry number {reserved}")))?;
    Ok(SequentialNumbering::starting_at(ENTRY_NUMBER_PREFIX, next))
}

async fn insert_entry<C: ConnectionTrait>(
    conn: &C,
    entry: &JournalEntry,
) -> Result<(), FinanceError> {
    let now = entry.posted_at.unwrap_or_else(Utc::now);
    convert::journal_entry_active(entry, now)
        .insert(conn)
        .await
        .map_err(db_err)?;
    for line in &entry.lines {
        convert::journal_line_active(entry.id, line)
            .insert(conn)
            .await
            .map_err(db_err)?;
    }
    Ok(())
}

async fn load_lines<C: ConnectionTrait>(
    conn: &C,
    entry_id: Uuid,
) -> Result<Vec<journal_entry_lines::Model>, FinanceError> {
    journal_entry_lines::Entity::find()
        .filter(journal_entry_lines::Column::JournalEntryId.eq(entry_id))
        .order_by_asc(journal_entry_lines::Column::LineNumber)
        .all(conn)
        .await
        .map_err(db_err)
}

async fn load_entry<C: ConnectionTrait>(
    conn: &C,
    entry_id: JournalEntryId,
    lock: bool,
) -> Result<JournalEntry, FinanceError> {
    let mut query = journal_entries::Entity::find_by_id(entry_id.into_inner());
    if lock {
        query = query.lock_exclusive();
    }
    let header = query
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| FinanceError::NotFound(format!("journal entry {entry_id}")))?;
    let lines = load_lines(conn, header.id).await?;
    convert::journal_entry(header, lines)
}
