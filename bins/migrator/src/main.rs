//! Database migration runner for Folio.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! Connection settings come from `AppConfig` (`FOLIO__DATABASE__URL` and
//! friends, or `config/*.toml`).

use anyhow::{Context, bail};
use folio_db::Migrator;
use folio_shared::AppConfig;
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config);

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    let db = folio_db::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    match command.as_str() {
        "up" => {
            Migrator::up(&db, None).await?;
            info!("migrations applied");
        }
        "down" => {
            Migrator::down(&db, Some(1)).await?;
            info!("last migration rolled back");
        }
        "status" => Migrator::status(&db).await?,
        "fresh" => {
            Migrator::fresh(&db).await?;
            info!("database recreated");
        }
        other => bail!("unknown command {other:?}, expected up, down, status or fresh"),
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
