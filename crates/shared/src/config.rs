//! Application configuration management.

use serde::Deserialize;

use crate::types::money::{CurrencyCode, CurrencyCodeError};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Posting configuration.
    #[serde(default)]
    pub posting: PostingConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Posting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PostingConfig {
    /// Functional (base) currency code used for ledger conversion.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
        }
    }
}

impl PostingConfig {
    /// Parsed base currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured code is not three letters.
    pub fn base_currency_code(&self) -> Result<CurrencyCode, CurrencyCodeError> {
        CurrencyCode::parse(&self.base_currency)
    }
}

fn default_base_currency() -> String {
    "USD".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON formatted log lines.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "folio_db=info,folio_migrator=info".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FOLIO").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
