//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `DebitNoteId` where a `SupplierInvoiceId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user acting on a document.");
typed_id!(CompanyId, "Unique identifier for a company.");
typed_id!(SupplierId, "Unique identifier for a supplier.");
typed_id!(CustomerId, "Unique identifier for a customer.");
typed_id!(AccountId, "Unique identifier for a general ledger account.");
typed_id!(CostCenterId, "Unique identifier for a cost center.");
typed_id!(FiscalYearId, "Unique identifier for a fiscal year.");
typed_id!(AccountingPeriodId, "Unique identifier for an accounting period.");
typed_id!(JournalEntryId, "Unique identifier for a journal entry.");
typed_id!(JournalLineId, "Unique identifier for a journal entry line.");
typed_id!(SupplierInvoiceId, "Unique identifier for a supplier invoice.");
typed_id!(DebitNoteId, "Unique identifier for a debit note.");
typed_id!(PaymentVoucherId, "Unique identifier for a payment voucher.");
typed_id!(SalesInvoiceId, "Unique identifier for a sales invoice.");
typed_id!(AllocationId, "Unique identifier for a payment voucher allocation.");
typed_id!(PayableLedgerId, "Unique identifier for a payable ledger row.");
