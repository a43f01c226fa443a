//! Caller-chosen general ledger accounts per document type.

use folio_shared::types::AccountId;
use serde::Serialize;
use uuid::Uuid;

use crate::document::DocumentKind;
use crate::error::FinanceError;

fn check_accounts(roles: &[(&str, AccountId)]) -> Result<(), FinanceError> {
    for (i, (role, account)) in roles.iter().enumerate() {
        if account.into_inner() == Uuid::nil() {
            return Err(FinanceError::InvalidAccountMapping(format!(
                "{role} account is not set"
            )));
        }
        if let Some((other, _)) = roles[..i].iter().find(|(_, a)| a == account) {
            return Err(FinanceError::InvalidAccountMapping(format!(
                "{role} and {other} use the same account {account}"
            )));
        }
    }
    Ok(())
}

/// Accounts for posting a supplier invoice. Expense accounts come from the lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvoiceAccounts {
    payable: AccountId,
    input_tax: Option<AccountId>,
}

impl InvoiceAccounts {
    /// Validates and creates the mapping.
    pub fn new(payable: AccountId, input_tax: Option<AccountId>) -> Result<Self, FinanceError> {
        let mut roles = vec![("payable", payable)];
        roles.extend(input_tax.map(|a| ("input tax", a)));
        check_accounts(&roles)?;
        Ok(Self { payable, input_tax })
    }

    /// Accounts payable.
    #[must_use]
    pub fn payable(&self) -> AccountId {
        self.payable
    }

    /// Recoverable input tax.
    #[must_use]
    pub fn input_tax(&self) -> Option<AccountId> {
        self.input_tax
    }
}

/// Accounts for posting a debit note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DebitNoteAccounts {
    payable: AccountId,
    purchase_returns: AccountId,
}

impl DebitNoteAccounts {
    /// Validates and creates the mapping.
    pub fn new(payable: AccountId, purchase_returns: AccountId) -> Result<Self, FinanceError> {
        check_accounts(&[("payable", payable), ("purchase returns", purchase_returns)])?;
        Ok(Self {
            payable,
            purchase_returns,
        })
    }

    /// Accounts payable.
    #[must_use]
    pub fn payable(&self) -> AccountId {
        self.payable
    }

    /// Purchase returns and allowances.
    #[must_use]
    pub fn purchase_returns(&self) -> AccountId {
        self.purchase_returns
    }
}

/// Accounts for posting a payment voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentAccounts {
    payable: AccountId,
    cash: AccountId,
}

impl PaymentAccounts {
    /// Validates and creates the mapping.
    pub fn new(payable: AccountId, cash: AccountId) -> Result<Self, FinanceError> {
        check_accounts(&[("payable", payable), ("cash", cash)])?;
        Ok(Self { payable, cash })
    }

    /// Accounts payable.
    #[must_use]
    pub fn payable(&self) -> AccountId {
        self.payable
    }

    /// Cash or bank account paid from.
    #[must_use]
    pub fn cash(&self) -> AccountId {
        self.cash
    }
}

/// Accounts for posting a sales invoice. Revenue accounts come from the lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SalesInvoiceAccounts {
    receivable: AccountId,
    output_tax: Option<AccountId>,
}

impl SalesInvoiceAccounts {
    /// Validates and creates the mapping.
    pub fn new(receivable: AccountId, output_tax: Option<AccountId>) -> Result<Self, FinanceError> {
        let mut roles = vec![("receivable", receivable)];
        roles.extend(output_tax.map(|a| ("output tax", a)));
        check_accounts(&roles)?;
        Ok(Self {
            receivable,
            output_tax,
        })
    }

    /// Accounts receivable.
    #[must_use]
    pub fn receivable(&self) -> AccountId {
        self.receivable
    }

    /// Output tax payable.
    #[must_use]
    pub fn output_tax(&self) -> Option<AccountId> {
        self.output_tax
    }
}

/// Account mapping for one posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountMapping {
    /// Supplier invoice accounts.
    SupplierInvoice(InvoiceAccounts),
    /// Debit note accounts.
    DebitNote(DebitNoteAccounts),
    /// Payment voucher accounts.
    PaymentVoucher(PaymentAccounts),
    /// Sales invoice accounts.
    SalesInvoice(SalesInvoiceAccounts),
}

impl AccountMapping {
    /// Document kind this mapping posts.
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::SupplierInvoice(_) => DocumentKind::SupplierInvoice,
            Self::DebitNote(_) => DocumentKind::DebitNote,
            Self::PaymentVoucher(_) => DocumentKind::PaymentVoucher,
            Self::SalesInvoice(_) => DocumentKind::SalesInvoice,
        }
    }
}
