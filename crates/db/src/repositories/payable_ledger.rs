//! Supplier payable ledger storage.

use chrono::{DateTime, NaiveDate, Utc};
use folio_core::FinanceError;
use folio_core::payable::{
    PayableEntry, PayableLedgerRecorder, PayableLedgerRow, PayableTransactionType,
};
use folio_shared::types::{CompanyId, CurrencyCode, Money, SupplierId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};

use super::convert::{self, db_err};
use super::exchange_rate::load_pair_rates;
use crate::entities::payable_ledger;

/// Supplier balance as of a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierBalance {
    /// Base currency balance, debits minus credits. Negative means owed.
    pub base: Decimal,
    /// Balance per foreign currency, debits minus credits.
    pub by_currency: Vec<(CurrencyCode, Decimal)>,
}

/// Payable ledger repository.
#[derive(Debug, Clone)]
pub struct PayableLedgerRepository {
    db: DatabaseConnection,
    base_currency: CurrencyCode,
}

impl PayableLedgerRepository {
    /// Creates a new payable ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, base_currency: CurrencyCode) -> Self {
        Self { db, base_currency }
    }

    /// Records a manual adjustment.
    ///
    /// Invoice, debit note and payment rows are written by posting and
    /// allocation; this entry point only takes adjustments.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for other movement types, negative amounts,
    /// or a movement with neither debit nor credit.
    pub async fn record_adjustment(
        &self,
        entry: PayableEntry,
    ) -> Result<PayableLedgerRow, FinanceError> {
        if entry.transaction_type != PayableTransactionType::Adjustment {
            return Err(FinanceError::InvalidInput(format!(
                "only adjustments can be recorded directly, got {}",
                entry.transaction_type
            )));
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        let mut rows = record_entries(&txn, &self.base_currency, vec![entry], Utc::now()).await?;
        txn.commit().await.map_err(db_err)?;

        rows.pop()
            .ok_or_else(|| FinanceError::Database("adjustment was not recorded".to_string()))
    }

    /// Rows of a supplier ordered by transaction date, then insertion time.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the query fails.
    pub async fn rows_for_supplier(
        &self,
        company_id: CompanyId,
        supplier_id: SupplierId,
    ) -> Result<Vec<PayableLedgerRow>, FinanceError> {
        payable_ledger::Entity::find()
            .filter(payable_ledger::Column::CompanyId.eq(company_id.into_inner()))
            .filter(payable_ledger::Column::SupplierId.eq(supplier_id.into_inner()))
            .order_by_asc(payable_ledger::Column::TransactionDate)
            .order_by_asc(payable_ledger::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(convert::payable_row)
            .collect()
    }

    /// Balance of a supplier over every row dated on or before `as_of`.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the query fails.
    pub async fn balance(
        &self,
        company_id: CompanyId,
        supplier_id: SupplierId,
        as_of: NaiveDate,
    ) -> Result<SupplierBalance, FinanceError> {
        let rows = self.rows_for_supplier(company_id, supplier_id).await?;
        Ok(summarize(rows.iter().filter(|r| r.transaction_date <= as_of)))
    }
}

fn summarize<'a>(rows: impl Iterator<Item = &'a PayableLedgerRow>) -> SupplierBalance {
    let mut base = Decimal::ZERO;
    let mut by_currency: Vec<(CurrencyCode, Decimal)> = Vec::new();
    for row in rows {
        base = Money::add(base, Money::sub(row.base_debit, row.base_credit));
        let movement = Money::sub(row.debit, row.credit);
        match by_currency.iter_mut().find(|(c, _)| c == &row.currency) {
            Some((_, balance)) => *balance = Money::add(*balance, movement),
            None => by_currency.push((row.currency.clone(), movement)),
        }
    }
    SupplierBalance { base, by_currency }
}

/// Computes and inserts ledger rows inside the caller's transaction.
///
/// Each row's running balance covers the supplier's rows dated strictly
/// before it; rows sharing its date do not contribute. Rows dated after a
/// new row take its movement into their running balances, so balances do
/// not depend on insertion order.
///
/// Writers for the same supplier are serialized with a transaction-scoped
/// advisory lock taken before any earlier row is read.
pub(crate) async fn record_entries<C: ConnectionTrait>(
    conn: &C,
    base_currency: &CurrencyCode,
    entries: Vec<PayableEntry>,
    now: DateTime<Utc>,
) -> Result<Vec<PayableLedgerRow>, FinanceError> {
    let mut suppliers: Vec<(CompanyId, SupplierId)> = entries
        .iter()
        .map(|e| (e.company_id, e.supplier_id))
        .collect();
    suppliers.sort_by_key(|(company, supplier)| (company.into_inner(), supplier.into_inner()));
    suppliers.dedup();
    for (company_id, supplier_id) in suppliers {
        lock_supplier(conn, company_id, supplier_id).await?;
    }

    let mut written: Vec<PayableLedgerRow> = Vec::with_capacity(entries.len());

    for entry in entries {
        let prior: Vec<PayableLedgerRow> = payable_ledger::Entity::find()
            .filter(payable_ledger::Column::CompanyId.eq(entry.company_id.into_inner()))
            .filter(payable_ledger::Column::SupplierId.eq(entry.supplier_id.into_inner()))
            .filter(payable_ledger::Column::TransactionDate.lt(entry.transaction_date))
            .all(conn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(convert::payable_row)
            .collect::<Result<_, _>>()?;

        let rates = load_pair_rates(
            conn,
            entry.company_id,
            &entry.currency,
            base_currency,
            entry.transaction_date,
        )
        .await?;

        let row = PayableLedgerRecorder::new(base_currency, &rates).record(entry, &prior, now)?;
        convert::payable_row_active(&row)
            .insert(conn)
            .await
            .map_err(db_err)?;
        carry_forward(conn, &row).await?;

        tracing::info!(
            row_id = %row.id,
            supplier_id = %row.supplier_id,
            transaction_type = %row.transaction_type,
            balance_base = %row.balance_base,
            "payable ledger row recorded"
        );
        written.push(row);
    }

    Ok(written)
}

async fn lock_supplier<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    supplier_id: SupplierId,
) -> Result<(), FinanceError> {
    let sql = format!(
        "SELECT pg_advisory_xact_lock(hashtextextended('payable_ledger:{company_id}:{supplier_id}', 0))"
    );
    conn.execute_unprepared(&sql).await.map_err(db_err)?;
    Ok(())
}

/// Adds `row`'s movement to the running balances of the supplier's later rows.
async fn carry_forward<C: ConnectionTrait>(
    conn: &C,
    row: &PayableLedgerRow,
) -> Result<(), FinanceError> {
    let later = payable_ledger::Column::CompanyId
        .eq(row.company_id.into_inner())
        .and(payable_ledger::Column::SupplierId.eq(row.supplier_id.into_inner()))
        .and(payable_ledger::Column::TransactionDate.gt(row.transaction_date));

    let base_movement = Money::sub(row.base_debit, row.base_credit);
    if !base_movement.is_zero() {
        payable_ledger::Entity::update_many()
            .col_expr(
                payable_ledger::Column::BalanceBase,
                Expr::col(payable_ledger::Column::BalanceBase).add(base_movement),
            )
            .filter(later.clone())
            .exec(conn)
            .await
            .map_err(db_err)?;
    }

    let foreign_movement = Money::sub(row.debit, row.credit);
    if !foreign_movement.is_zero() {
        payable_ledger::Entity::update_many()
            .col_expr(
                payable_ledger::Column::BalanceForeign,
                Expr::col(payable_ledger::Column::BalanceForeign).add(foreign_movement),
            )
            .filter(later.and(payable_ledger::Column::Currency.eq(row.currency.as_str())))
            .exec(conn)
            .await
            .map_err(db_err)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_shared::types::PayableLedgerId;
    use rust_decimal_macros::dec;

    fn row(currency: &str, debit: Decimal, credit: Decimal, base_debit: Decimal, base_credit: Decimal) -> PayableLedgerRow {
        let on = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PayableLedgerRow {
            id: PayableLedgerId::new(),
            company_id: CompanyId::new(),
            supplier_id: SupplierId::new(),
            transaction_date: on,
            transaction_type: PayableTransactionType::Invoice,
            reference: None,
            currency: CurrencyCode::parse(currency).unwrap(),
            debit,
            credit,
            exchange_rate: Decimal::ONE,
            rate_effective_date: on,
            base_debit,
            base_credit,
            balance_foreign: Decimal::ZERO,
            balance_base: Decimal::ZERO,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summarize_splits_currencies() {
        let rows = [
            row("USD", dec!(0), dec!(500), dec!(0), dec!(500)),
            row("EUR", dec!(0), dec!(100), dec!(0), dec!(110)),
            row("USD", dec!(200), dec!(0), dec!(200), dec!(0)),
        ];
        let balance = summarize(rows.iter());

        assert_eq!(balance.base, dec!(-410));
        assert_eq!(balance.by_currency.len(), 2);
        assert_eq!(balance.by_currency[0].1, dec!(-300));
        assert_eq!(balance.by_currency[1].1, dec!(-100));
    }

    #[test]
    fn test_summarize_empty() {
        let balance = summarize(std::iter::empty());
        assert_eq!(balance.base, Decimal::ZERO);
        assert!(balance.by_currency.is_empty());
    }
}
