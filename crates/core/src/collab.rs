//! External collaborators: document numbering and authorization.
//!
//! The engines never decide who the acting user is or how entry numbers
//! are generated. Both are supplied by the caller through these traits.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use folio_shared::types::{CompanyId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::FinanceError;

/// Number series handed out by [`DocumentNumbering`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberSeries {
    /// Journal entry numbers.
    JournalEntry,
}

/// Supplies unique document numbers.
pub trait DocumentNumbering: Send + Sync {
    /// Returns the next number in the series for the company.
    fn next_number(&self, series: NumberSeries, company_id: CompanyId) -> String;
}

/// Gated capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Post a source document to the general ledger.
    PostToLedger,
    /// Reverse a posted journal entry.
    ReverseEntry,
    /// Allocate payment voucher funds to invoices.
    AllocatePayment,
    /// Place or remove a hold on a payment voucher.
    ManageHold,
    /// Move a payment voucher through its approval workflow.
    ApprovePayment,
}

impl Capability {
    /// Returns the string representation of the capability.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostToLedger => "post_to_ledger",
            Self::ReverseEntry => "reverse_entry",
            Self::AllocatePayment => "allocate_payment",
            Self::ManageHold => "manage_hold",
            Self::ApprovePayment => "approve_payment",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolves the acting user and checks capabilities.
pub trait Authorizer: Send + Sync {
    /// Returns the acting user if they hold the capability.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::Unauthorized` when the capability is missing.
    fn authorize(&self, capability: Capability) -> Result<UserId, FinanceError>;
}

/// In-process sequential numbering, `PREFIX-000001` style.
///
/// Suitable for single-process tools and tests. Multi-process deployments
/// should back [`DocumentNumbering`] with a database sequence.
#[derive(Debug)]
pub struct SequentialNumbering {
    prefix: String,
    next: AtomicU64,
}

impl SequentialNumbering {
    /// Creates a sequence starting at 1.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::starting_at(prefix, 1)
    }

    /// Creates a sequence starting at `start`.
    #[must_use]
    pub fn starting_at(prefix: impl Into<String>, start: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(start),
        }
    }
}

impl DocumentNumbering for SequentialNumbering {
    fn next_number(&self, _series: NumberSeries, _company_id: CompanyId) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n:06}", self.prefix)
    }
}

/// Authorizer that grants a fixed capability set to one user.
#[derive(Debug, Clone)]
pub struct GrantedCapabilities {
    user_id: UserId,
    granted: Vec<Capability>,
}

impl GrantedCapabilities {
    /// Grants the listed capabilities to `user_id`.
    #[must_use]
    pub fn new(user_id: UserId, granted: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            user_id,
            granted: granted.into_iter().collect(),
        }
    }

    /// Grants every capability to `user_id`.
    #[must_use]
    pub fn all(user_id: UserId) -> Self {
        Self::new(
            user_id,
            [
                Capability::PostToLedger,
                Capability::ReverseEntry,
                Capability::AllocatePayment,
                Capability::ManageHold,
                Capability::ApprovePayment,
            ],
        )
    }
}

impl Authorizer for GrantedCapabilities {
    fn authorize(&self, capability: Capability) -> Result<UserId, FinanceError> {
        if self.granted.contains(&capability) {
            Ok(self.user_id)
        } else {
            Err(FinanceError::Unauthorized(capability))
        }
    }
}
