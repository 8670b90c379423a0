//! CLI command implementations.

pub mod migrate;
pub mod store;

use secrecy::SecretString;
use sqlx::PgPool;

/// Connect using `STOREDESK_DATABASE_URL`, falling back to `DATABASE_URL`.
pub(crate) async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("STOREDESK_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| ConnectError::MissingEnvVar("STOREDESK_DATABASE_URL"))?;

    tracing::info!("Connecting to dashboard database...");
    Ok(storedesk_admin::db::create_pool(&SecretString::from(url)).await?)
}

/// Errors raised while connecting to the database.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}
