//! Store repository.

use sqlx::PgPool;

use storedesk_core::StoreId;

use super::RepositoryError;
use crate::models::Store;

const STORE_COLUMNS: &str = "id, name, user_id, created_at, updated_at";

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the stores owned by a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Store>, RepositoryError> {
        let stores = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE user_id = $1 ORDER BY created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(stores)
    }

    /// Get a store by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(store)
    }

    /// Find a store by name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Store>, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE lower(name) = lower($1)"
        ))
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(store)
    }

    /// Create a store for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a store with the same name
    /// (case-insensitive) exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, name: &str, user_id: &str) -> Result<Store, RepositoryError> {
        sqlx::query_as::<_, Store>(&format!(
            "INSERT INTO stores (name, user_id) VALUES ($1, $2) RETURNING {STORE_COLUMNS}"
        ))
        .bind(name)
        .bind(user_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::classify(e, "Store already exist", "Store in use"))
    }

    /// Rename a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    /// Returns `RepositoryError::Conflict` if another store has the name.
    pub async fn rename(&self, id: StoreId, name: &str) -> Result<Store, RepositoryError> {
        sqlx::query_as::<_, Store>(&format!(
            "UPDATE stores SET name = $2, updated_at = now() WHERE id = $1 RETURNING {STORE_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::classify(e, "Store already exist", "Store in use"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a store and, through cascades, everything it owns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    pub async fn delete(&self, id: StoreId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
