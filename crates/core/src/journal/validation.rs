//! Balance validation for journal line sets.

use rust_decimal::Decimal;

use super::types::{JournalLine, JournalTotals};
use crate::error::FinanceError;

/// Validates that a line set can be posted.
///
/// Checks, in order: at least two lines, no negative amounts, no line
/// with both sides zero, and exact debit/credit equality in entry
/// currency and then in base currency.
///
/// # Errors
///
/// Returns `InvalidInput` for malformed lines and `UnbalancedEntry`
/// carrying both totals when the set does not balance.
pub fn validate_lines(lines: &[JournalLine]) -> Result<JournalTotals, FinanceError> {
    if lines.len() < 2 {
        return Err(FinanceError::InvalidInput(format!(
            "journal entry needs at least two lines, got {}",
            lines.len()
        )));
    }

    for line in lines {
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(FinanceError::InvalidInput(format!(
                "line {} has a negative amount (debit {}, credit {})",
                line.line_number, line.debit, line.credit
            )));
        }
        if line.debit.is_zero() && line.credit.is_zero() {
            return Err(FinanceError::InvalidInput(format!(
                "line {} has neither a debit nor a credit",
                line.line_number
            )));
        }
    }

    let totals = JournalTotals::of(lines);
    if totals.debit != totals.credit {
        return Err(FinanceError::UnbalancedEntry {
            debit: totals.debit,
            credit: totals.credit,
        });
    }
    if totals.base_debit != totals.base_credit {
        return Err(FinanceError::UnbalancedEntry {
            debit: totals.base_debit,
            credit: totals.base_credit,
        });
    }

    Ok(totals)
}
