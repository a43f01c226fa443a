//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Transactional repositories over the `folio-core` services
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use migration::Migrator;
pub use repositories::{
    AllocationRepository, DocumentRepository, ExchangeRateRepository, FiscalRepository,
    PayableLedgerRepository, PostingRepository, VoucherRepository,
};

use folio_core::FinanceError;
use folio_shared::config::{DatabaseConfig, PostingConfig};
use folio_shared::types::CurrencyCode;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Every repository over one connection pool and base currency.
#[derive(Debug, Clone)]
pub struct Repositories {
    /// Functional currency shared by all repositories.
    pub base_currency: CurrencyCode,
    /// Source documents and their status history.
    pub documents: DocumentRepository,
    /// Fiscal years and accounting periods.
    pub fiscal: FiscalRepository,
    /// Exchange rates.
    pub exchange_rates: ExchangeRateRepository,
    /// Posting and reversal.
    pub posting: PostingRepository,
    /// Payment allocation.
    pub allocations: AllocationRepository,
    /// Voucher holds and lifecycle.
    pub vouchers: VoucherRepository,
    /// Supplier payable ledger.
    pub payable_ledger: PayableLedgerRepository,
}

impl Repositories {
    /// Builds every repository for `base_currency`.
    #[must_use]
    pub fn new(db: DatabaseConnection, base_currency: CurrencyCode) -> Self {
        Self {
            documents: DocumentRepository::new(db.clone(), base_currency.clone()),
            fiscal: FiscalRepository::new(db.clone()),
            exchange_rates: ExchangeRateRepository::new(db.clone()),
            posting: PostingRepository::new(db.clone(), base_currency.clone()),
            allocations: AllocationRepository::new(db.clone(), base_currency.clone()),
            vouchers: VoucherRepository::new(db.clone(), base_currency.clone()),
            payable_ledger: PayableLedgerRepository::new(db, base_currency.clone()),
            base_currency,
        }
    }

    /// Builds every repository for the configured base currency.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `posting.base_currency` is not a currency code.
    pub fn from_config(db: DatabaseConnection, config: &PostingConfig) -> Result<Self, FinanceError> {
        let base_currency = config.base_currency_code().map_err(|err| {
            FinanceError::InvalidInput(format!("posting.base_currency: {err}"))
        })?;
        tracing::debug!(base_currency = %base_currency, "repositories configured");
        Ok(Self::new(db, base_currency))
    }
}

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    tracing::debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "connecting to database"
    );
    Database::connect(options).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repositories_use_configured_base_currency() {
        let config = PostingConfig {
            base_currency: " eur ".to_string(),
        };
        let repos = Repositories::from_config(DatabaseConnection::Disconnected, &config).unwrap();
        assert_eq!(repos.base_currency.as_str(), "EUR");
    }

    #[test]
    fn test_invalid_base_currency_is_rejected() {
        let config = PostingConfig {
            base_currency: "EURO".to_string(),
        };
        let result = Repositories::from_config(DatabaseConnection::Disconnected, &config);
        assert!(matches!(result, Err(FinanceError::InvalidInput(_))));
    }
}
