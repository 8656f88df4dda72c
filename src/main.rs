//! SchoolHub data layer bootstrap.
//!
//! Loads configuration, initializes logging, connects to PostgreSQL,
//! applies pending migrations and verifies connectivity.

use tracing_subscriber::{EnvFilter, fmt};

use schoolhub_core::config::AppConfig;
use schoolhub_core::error::AppError;
use schoolhub_database::DatabasePool;

#[tokio::main]
async fn main() {
    let env = std::env::var("SCHOOLHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(kind = %e.kind, "Startup failed: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting SchoolHub v{}", env!("CARGO_PKG_VERSION"));

    let db = DatabasePool::connect(&config.database).await?;

    schoolhub_database::migration::run_migrations(db.pool()).await?;

    if !db.health_check().await? {
        db.close().await;
        return Err(AppError::connection_unavailable(
            "Database health check returned an unexpected value",
        ));
    }
    tracing::info!(
        session_policy = ?config.database.session_policy,
        "Database ready"
    );

    db.close().await;
    Ok(())
}
