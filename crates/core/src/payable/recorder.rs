//! Computes payable ledger rows with running balances.

use chrono::{DateTime, Utc};
use folio_shared::types::{CurrencyCode, Money, PayableLedgerId};
use rust_decimal::Decimal;

use super::types::{PayableEntry, PayableLedgerRow};
use crate::currency::{ExchangeRate, convert_to_base, resolve_rate};
use crate::error::FinanceError;

/// Turns [`PayableEntry`] movements into ledger rows.
///
/// Balances are debits minus credits over every earlier row for the same
/// company and supplier dated strictly before the movement, plus the
/// movement itself. Rows on the same date do not see each other, so the
/// result does not depend on insertion order.
#[derive(Debug, Clone, Copy)]
pub struct PayableLedgerRecorder<'a> {
    base_currency: &'a CurrencyCode,
    rates: &'a [ExchangeRate],
}

impl<'a> PayableLedgerRecorder<'a> {
    /// Creates a recorder converting into `base_currency` using `rates`.
    #[must_use]
    pub fn new(base_currency: &'a CurrencyCode, rates: &'a [ExchangeRate]) -> Self {
        Self {
            base_currency,
            rates,
        }
    }

    /// Builds the row for `entry` given the supplier's existing rows.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for negative amounts or a movement with
    /// neither a debit nor a credit.
    pub fn record(
        &self,
        entry: PayableEntry,
        prior_rows: &[PayableLedgerRow],
        now: DateTime<Utc>,
    ) -> Result<PayableLedgerRow, FinanceError> {
        Self::validate(&entry)?;

        let resolved = resolve_rate(
            self.rates,
            &entry.currency,
            self.base_currency,
            entry.transaction_date,
        );

        let debit = Money::round(entry.debit);
        let credit = Money::round(entry.credit);
        let base_debit = entry
            .base_debit
            .map_or_else(|| convert_to_base(debit, resolved.rate), Money::round);
        let base_credit = entry
            .base_credit
            .map_or_else(|| convert_to_base(credit, resolved.rate), Money::round);

        let earlier = prior_rows.iter().filter(|row| {
            row.company_id == entry.company_id
                && row.supplier_id == entry.supplier_id
                && row.transaction_date < entry.transaction_date
        });

        let mut balance_base = Money::sub(base_debit, base_credit);
        let mut balance_foreign = Money::sub(debit, credit);
        for row in earlier {
            balance_base += row.base_debit - row.base_credit;
            if row.currency == entry.currency {
                balance_foreign += row.debit - row.credit;
            }
        }

        Ok(PayableLedgerRow {
            id: PayableLedgerId::new(),
            company_id: entry.company_id,
            supplier_id: entry.supplier_id,
            transaction_date: entry.transaction_date,
            transaction_type: entry.transaction_type,
            reference: entry.reference,
            currency: entry.currency,
            debit,
            credit,
            exchange_rate: resolved.rate,
            rate_effective_date: resolved.effective_date.unwrap_or(entry.transaction_date),
            base_debit,
            base_credit,
            balance_foreign: Money::round(balance_foreign),
            balance_base: Money::round(balance_base),
            description: entry.description,
            created_at: now,
        })
    }

    fn validate(entry: &PayableEntry) -> Result<(), FinanceError> {
        let amounts = [
            Some(entry.debit),
            Some(entry.credit),
            entry.base_debit,
            entry.base_credit,
        ];
        if amounts.into_iter().flatten().any(|a| a < Decimal::ZERO) {
            return Err(FinanceError::InvalidInput(format!(
                "payable amounts must not be negative (debit {}, credit {})",
                entry.debit, entry.credit
            )));
        }
        if Money::round(entry.debit).is_zero() && Money::round(entry.credit).is_zero() {
            return Err(FinanceError::InvalidInput(
                "payable entry needs a debit or a credit".to_string(),
            ));
        }
        Ok(())
    }
}
