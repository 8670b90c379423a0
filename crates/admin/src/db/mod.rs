//! Database operations for the dashboard `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `stores` - Stores, each owned by one identity-provider user
//! - `billboards`, `categories`, `sizes`, `colours` - Per-store catalog metadata
//! - `products`, `images` - Sellable products and their pictures
//! - `orders`, `order_items` - Checkout orders (see [`crate::ledger`])
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p storedesk-cli -- migrate
//! ```

pub mod billboards;
pub mod categories;
pub mod colours;
pub mod orders;
pub mod products;
pub mod sizes;
pub mod stores;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use billboards::{BillboardInput, BillboardRepository};
pub use categories::{CategoryInput, CategoryRepository};
pub use colours::{ColourInput, ColourRepository};
pub use orders::{GraphPoint, OrderRepository};
pub use products::{ProductFilter, ProductInput, ProductRepository};
pub use sizes::{SizeInput, SizeRepository};
pub use stores::StoreRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate name, entity still referenced).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Re-classify unique and foreign-key violations as [`Self::Conflict`].
    ///
    /// `duplicate` is used for unique violations, `in_use` for rows that are
    /// still referenced elsewhere.
    #[must_use]
    pub fn classify(e: sqlx::Error, duplicate: &str, in_use: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return Self::Conflict(duplicate.to_owned());
            }
            if db_err.is_foreign_key_violation() {
                return Self::Conflict(in_use.to_owned());
            }
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Create a pool that connects on first use.
///
/// Used by router tests that never touch the database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL cannot be parsed.
pub fn create_lazy_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy(database_url.expose_secret())
}
