//! Payable ledger types.

use chrono::{DateTime, NaiveDate, Utc};
use folio_shared::types::{CompanyId, CurrencyCode, PayableLedgerId, SupplierId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::DocumentRef;

/// What produced a payable ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayableTransactionType {
    /// Supplier invoice posted.
    Invoice,
    /// Debit note posted.
    DebitNote,
    /// Payment allocated to an invoice.
    Payment,
    /// Manual adjustment.
    Adjustment,
}

impl PayableTransactionType {
    /// Returns the string representation of the transaction type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::DebitNote => "debit_note",
            Self::Payment => "payment",
            Self::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for PayableTransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A movement to record against a supplier.
///
/// Amounts are in `currency`. Base amounts are optional; when absent they
/// are converted at the rate in effect on `transaction_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayableEntry {
    /// Owning company.
    pub company_id: CompanyId,
    /// Supplier the movement belongs to.
    pub supplier_id: SupplierId,
    /// Date the movement takes effect.
    pub transaction_date: NaiveDate,
    /// Movement type.
    pub transaction_type: PayableTransactionType,
    /// Source document, if any.
    pub reference: Option<DocumentRef>,
    /// Currency of `debit` and `credit`.
    pub currency: CurrencyCode,
    /// Debit in `currency`.
    pub debit: Decimal,
    /// Credit in `currency`.
    pub credit: Decimal,
    /// Debit already converted to base.
    pub base_debit: Option<Decimal>,
    /// Credit already converted to base.
    pub base_credit: Option<Decimal>,
    /// Description.
    pub description: String,
}

/// An immutable payable ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayableLedgerRow {
    /// Unique identifier.
    pub id: PayableLedgerId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Supplier.
    pub supplier_id: SupplierId,
    /// Date the movement takes effect.
    pub transaction_date: NaiveDate,
    /// Movement type.
    pub transaction_type: PayableTransactionType,
    /// Source document, if any.
    pub reference: Option<DocumentRef>,
    /// Foreign currency.
    pub currency: CurrencyCode,
    /// Debit in foreign currency.
    pub debit: Decimal,
    /// Credit in foreign currency.
    pub credit: Decimal,
    /// Rate used for conversion.
    pub exchange_rate: Decimal,
    /// Effective date of that rate.
    pub rate_effective_date: NaiveDate,
    /// Debit in base currency.
    pub base_debit: Decimal,
    /// Credit in base currency.
    pub base_credit: Decimal,
    /// Running foreign balance for supplier and currency, debits minus credits.
    pub balance_foreign: Decimal,
    /// Running base balance for supplier, debits minus credits.
    pub balance_base: Decimal,
    /// Description.
    pub description: String,
    /// When the row was written.
    pub created_at: DateTime<Utc>,
}
