//! Journal entry domain types.

use chrono::{DateTime, NaiveDate, Utc};
use folio_shared::types::{
    AccountId, AccountingPeriodId, CompanyId, CostCenterId, CurrencyCode, FiscalYearId,
    JournalEntryId, JournalLineId, Money, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::document::DocumentKind;

/// Kind of journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalEntryType {
    /// Entered by hand.
    Manual,
    /// Generated from a source document.
    Automatic,
    /// Opening balances.
    Opening,
    /// Year-end closing.
    Closing,
    /// Period-end adjustment.
    Adjusting,
    /// Reverses an earlier entry.
    Reversing,
    /// Moves balances between accounts.
    Reclassification,
    /// Between companies of a group.
    Intercompany,
}

impl JournalEntryType {
    /// Returns the string representation of the entry type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
            Self::Opening => "opening",
            Self::Closing => "closing",
            Self::Adjusting => "adjusting",
            Self::Reversing => "reversing",
            Self::Reclassification => "reclassification",
            Self::Intercompany => "intercompany",
        }
    }
}

impl fmt::Display for JournalEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Journal entry lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalStatus {
    /// Being drafted.
    Draft,
    /// Submitted for review.
    Submitted,
    /// Posted to the ledger (immutable).
    Posted,
    /// Cancelled before posting.
    Cancelled,
}

impl JournalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Posted => "posted",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JournalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a journal entry was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    /// Supplier invoice.
    SupplierInvoice,
    /// Debit note.
    DebitNote,
    /// Payment voucher.
    PaymentVoucher,
    /// Sales invoice.
    SalesInvoice,
    /// Another journal entry (reversals).
    JournalEntry,
}

impl ReferenceType {
    /// Returns the string representation of the reference type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SupplierInvoice => "supplier_invoice",
            Self::DebitNote => "debit_note",
            Self::PaymentVoucher => "payment_voucher",
            Self::SalesInvoice => "sales_invoice",
            Self::JournalEntry => "journal_entry",
        }
    }
}

impl From<DocumentKind> for ReferenceType {
    fn from(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::SupplierInvoice => Self::SupplierInvoice,
            DocumentKind::DebitNote => Self::DebitNote,
            DocumentKind::PaymentVoucher => Self::PaymentVoucher,
            DocumentKind::SalesInvoice => Self::SalesInvoice,
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Back-reference from a journal entry to its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalReference {
    /// Source type.
    pub reference_type: ReferenceType,
    /// Source id.
    pub reference_id: Uuid,
    /// Source document number.
    pub reference_number: String,
}

/// A single journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Unique identifier.
    pub id: JournalLineId,
    /// 1-based position within the entry.
    pub line_number: i32,
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit in entry currency.
    pub debit: Decimal,
    /// Credit in entry currency.
    pub credit: Decimal,
    /// Debit converted at the header rate.
    pub base_debit: Decimal,
    /// Credit converted at the header rate.
    pub base_credit: Decimal,
    /// Line description.
    pub description: Option<String>,
    /// Optional cost center.
    pub cost_center_id: Option<CostCenterId>,
}

impl JournalLine {
    /// Signed amount, positive for debits.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Debit and credit totals of a line set, in entry and base currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalTotals {
    /// Sum of debits.
    pub debit: Decimal,
    /// Sum of credits.
    pub credit: Decimal,
    /// Sum of base-currency debits.
    pub base_debit: Decimal,
    /// Sum of base-currency credits.
    pub base_credit: Decimal,
}

impl JournalTotals {
    /// Computes totals over a line set.
    #[must_use]
    pub fn of(lines: &[JournalLine]) -> Self {
        Self {
            debit: Money::sum(lines.iter().map(|l| l.debit)),
            credit: Money::sum(lines.iter().map(|l| l.credit)),
            base_debit: Money::sum(lines.iter().map(|l| l.base_debit)),
            base_credit: Money::sum(lines.iter().map(|l| l.base_credit)),
        }
    }

    /// Returns true if debits equal credits exactly in both currencies.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit && self.base_debit == self.base_credit
    }
}

/// A journal entry with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Entry number from the numbering service.
    pub entry_number: String,
    /// Owning company.
    pub company_id: CompanyId,
    /// Fiscal year the entry date falls in.
    pub fiscal_year_id: FiscalYearId,
    /// Accounting period the entry date falls in.
    pub accounting_period_id: AccountingPeriodId,
    /// Entry type.
    pub entry_type: JournalEntryType,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Entry currency.
    pub currency: CurrencyCode,
    /// Rate to the base currency.
    pub exchange_rate: Decimal,
    /// Description.
    pub description: String,
    /// Source reference.
    pub reference: JournalReference,
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// Lifecycle status.
    pub status: JournalStatus,
    /// Who posted the entry.
    pub posted_by: Option<UserId>,
    /// When the entry was posted.
    pub posted_at: Option<DateTime<Utc>>,
    /// Entry this one reverses.
    pub reversal_of: Option<JournalEntryId>,
    /// Entry that reverses this one.
    pub reversal_entry_id: Option<JournalEntryId>,
    /// Lines in order.
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Returns true once the entry is posted.
    #[must_use]
    pub fn is_posted(&self) -> bool {
        self.status == JournalStatus::Posted
    }

    /// Returns true if a reversing entry exists for this entry.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.reversal_entry_id.is_some()
    }

    /// Recomputes totals from the lines.
    #[must_use]
    pub fn totals(&self) -> JournalTotals {
        JournalTotals::of(&self.lines)
    }
}
