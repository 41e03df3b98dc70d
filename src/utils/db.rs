// src/utils/db.rs

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::error::AppError;

/// Partial unique index on `assessment_attempt(idempotency_key)`.
pub const IDEMPOTENCY_KEY_INDEX: &str = "uq_assessment_attempt_idempotency_key";

/// Primary key of `assessment_attempt`; a second insert of the same id means the
/// attempt was already submitted.
pub const ATTEMPT_PRIMARY_KEY: &str = "assessment_attempt_pkey";

/// Opens the shared pool, retrying while the database is still starting up.
pub async fn connect_with_retry(config: &Config) -> Result<PgPool, AppError> {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(e) => {
                retry_count += 1;
                if retry_count > config.connect_retries {
                    tracing::error!(
                        "Failed to connect to database after {} retries: {:?}",
                        config.connect_retries,
                        e
                    );
                    return Err(AppError::from_db("connect", e));
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

/// Applies the embedded migrations in `./migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Migrations applied successfully.");
    Ok(())
}
