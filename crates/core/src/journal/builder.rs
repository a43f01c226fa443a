//! Accumulates debit and credit lines for a journal entry.

use folio_shared::types::{AccountId, CostCenterId, JournalLineId, Money};
use rust_decimal::Decimal;

use super::types::JournalLine;
use crate::currency::convert_to_base;

#[derive(Debug, Clone)]
struct LineDraft {
    account_id: AccountId,
    debit: Decimal,
    credit: Decimal,
    description: Option<String>,
    cost_center_id: Option<CostCenterId>,
}

/// Ordered line set under construction.
///
/// Zero amounts are dropped so optional lines (tax, discount) can be
/// pushed unconditionally.
#[derive(Debug, Clone, Default)]
pub struct LineSetBuilder {
    drafts: Vec<LineDraft>,
}

impl LineSetBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a debit line.
    #[must_use]
    pub fn debit(
        self,
        account_id: AccountId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        self.push(account_id, amount, Decimal::ZERO, description.into(), None)
    }

    /// Adds a debit line tagged with a cost center.
    #[must_use]
    pub fn debit_with_cost_center(
        self,
        account_id: AccountId,
        amount: Decimal,
        description: impl Into<String>,
        cost_center_id: Option<CostCenterId>,
    ) -> Self {
        self.push(
            account_id,
            amount,
            Decimal::ZERO,
            description.into(),
            cost_center_id,
        )
    }

    /// Adds a credit line.
    #[must_use]
    pub fn credit(
        self,
        account_id: AccountId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        self.push(account_id, Decimal::ZERO, amount, description.into(), None)
    }

    /// Adds a credit line tagged with a cost center.
    #[must_use]
    pub fn credit_with_cost_center(
        self,
        account_id: AccountId,
        amount: Decimal,
        description: impl Into<String>,
        cost_center_id: Option<CostCenterId>,
    ) -> Self {
        self.push(
            account_id,
            Decimal::ZERO,
            amount,
            description.into(),
            cost_center_id,
        )
    }

    fn push(
        mut self,
        account_id: AccountId,
        debit: Decimal,
        credit: Decimal,
        description: String,
        cost_center_id: Option<CostCenterId>,
    ) -> Self {
        let debit = Money::round(debit);
        let credit = Money::round(credit);
        if debit.is_zero() && credit.is_zero() {
            return self;
        }
        self.drafts.push(LineDraft {
            account_id,
            debit,
            credit,
            description: Some(description).filter(|d| !d.is_empty()),
            cost_center_id,
        });
        self
    }

    /// Finishes the line set, numbering lines from 1 and converting to base at `rate`.
    ///
    /// Lines are rounded to base one by one, so a set that balances in
    /// entry currency can drift apart in base. The residue goes to the
    /// largest line on the short side.
    #[must_use]
    pub fn build(self, rate: Decimal) -> Vec<JournalLine> {
        let mut lines: Vec<JournalLine> = self
            .drafts
            .into_iter()
            .zip(1..)
            .map(|(draft, line_number)| JournalLine {
                id: JournalLineId::new(),
                line_number,
                account_id: draft.account_id,
                debit: draft.debit,
                credit: draft.credit,
                base_debit: convert_to_base(draft.debit, rate),
                base_credit: convert_to_base(draft.credit, rate),
                description: draft.description,
                cost_center_id: draft.cost_center_id,
            })
            .collect();
        absorb_base_residue(&mut lines);
        lines
    }
}

fn absorb_base_residue(lines: &mut [JournalLine]) {
    let debit = Money::sum(lines.iter().map(|l| l.debit));
    let credit = Money::sum(lines.iter().map(|l| l.credit));
    if debit != credit {
        return;
    }

    let residue = Money::sum(lines.iter().map(|l| l.base_debit))
        - Money::sum(lines.iter().map(|l| l.base_credit));
    if residue > Decimal::ZERO {
        if let Some(line) = lines.iter_mut().max_by_key(|l| l.base_credit) {
            line.base_credit += residue;
        }
    } else if residue < Decimal::ZERO {
        if let Some(line) = lines.iter_mut().max_by_key(|l| l.base_debit) {
            line.base_debit -= residue;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_lines_are_numbered_in_order() {
        let a = AccountId::new();
        let b = AccountId::new();
        let lines = LineSetBuilder::new()
            .debit(a, dec!(100), "expense")
            .credit(b, dec!(100), "payable")
            .build(Decimal::ONE);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_number, 1);
        assert_eq!(lines[0].account_id, a);
        assert_eq!(lines[1].line_number, 2);
        assert_eq!(lines[1].credit, dec!(100));
    }

    #[test]
    fn test_zero_lines_are_dropped() {
        let lines = LineSetBuilder::new()
            .debit(AccountId::new(), dec!(0), "tax")
            .debit(AccountId::new(), dec!(10), "expense")
            .credit(AccountId::new(), dec!(10), "payable")
            .build(Decimal::ONE);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_number, 1);
    }

    #[test]
    fn test_base_amounts_use_rate() {
        let lines = LineSetBuilder::new()
            .debit(AccountId::new(), dec!(100.25), "expense")
            .credit(AccountId::new(), dec!(100.25), "payable")
            .build(dec!(1.1));
        assert_eq!(lines[0].base_debit, dec!(110.275));
        assert_eq!(lines[0].base_credit, dec!(0));
        assert_eq!(lines[1].base_credit, dec!(110.275));
    }

    #[test]
    fn test_base_rounding_residue_goes_to_largest_line() {
        let payable = AccountId::new();
        let lines = LineSetBuilder::new()
            .debit(AccountId::new(), dec!(1.0001), "freight")
            .debit(AccountId::new(), dec!(1.0001), "packing")
            .credit(payable, dec!(2.0002), "payable")
            .build(dec!(1.5));

        assert_eq!(lines[0].base_debit, dec!(1.5002));
        assert_eq!(lines[1].base_debit, dec!(1.5002));
        assert_eq!(lines[2].account_id, payable);
        assert_eq!(lines[2].base_credit, dec!(3.0004));
    }

    #[test]
    fn test_unbalanced_sets_are_left_alone() {
        let lines = LineSetBuilder::new()
            .debit(AccountId::new(), dec!(10), "expense")
            .credit(AccountId::new(), dec!(9), "payable")
            .build(dec!(1.5));
        assert_eq!(lines[0].base_debit, dec!(15));
        assert_eq!(lines[1].base_credit, dec!(13.5));
    }

    #[test]
    fn test_cost_center_is_kept() {
        let cc = CostCenterId::new();
        let lines = LineSetBuilder::new()
            .debit_with_cost_center(AccountId::new(), dec!(5), "", Some(cc))
            .build(Decimal::ONE);
        assert_eq!(lines[0].cost_center_id, Some(cc));
        assert_eq!(lines[0].description, None);
    }
}
