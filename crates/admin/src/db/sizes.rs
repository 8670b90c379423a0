//! Size repository.

use sqlx::PgPool;

use storedesk_core::{SizeId, StoreId};

use super::RepositoryError;
use crate::models::Size;

const SIZE_COLUMNS: &str = "id, store_id, name, value, created_at, updated_at";

/// Size fields supplied on create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeInput {
    pub name: String,
    pub value: String,
}

impl SizeInput {
    /// Whether applying this input would leave `size` unchanged.
    #[must_use]
    pub fn matches(&self, size: &Size) -> bool {
        self.name == size.name && self.value == size.value
    }
}

/// Repository for size database operations.
pub struct SizeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SizeRepository<'a> {
    /// Create a new size repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a store's sizes, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, store_id: StoreId) -> Result<Vec<Size>, RepositoryError> {
        let rows = sqlx::query_as::<_, Size>(&format!(
            "SELECT {SIZE_COLUMNS} FROM sizes WHERE store_id = $1 ORDER BY created_at ASC"
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get one of a store's sizes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, store_id: StoreId, id: SizeId) -> Result<Option<Size>, RepositoryError> {
        let row = sqlx::query_as::<_, Size>(&format!(
            "SELECT {SIZE_COLUMNS} FROM sizes WHERE store_id = $1 AND id = $2"
        ))
        .bind(store_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a size.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the store already has a size
    /// with this name.
    pub async fn create(&self, store_id: StoreId, input: &SizeInput) -> Result<Size, RepositoryError> {
        sqlx::query_as::<_, Size>(&format!(
            "INSERT INTO sizes (store_id, name, value) VALUES ($1, $2, $3) RETURNING {SIZE_COLUMNS}"
        ))
        .bind(store_id)
        .bind(&input.name)
        .bind(&input.value)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::classify(e, "Size already exist", "Store not exist"))
    }

    /// Replace a size's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the size does not exist.
    /// Returns `RepositoryError::Conflict` if the new name is taken.
    pub async fn update(
        &self,
        store_id: StoreId,
        id: SizeId,
        input: &SizeInput,
    ) -> Result<Size, RepositoryError> {
        sqlx::query_as::<_, Size>(&format!(
            "UPDATE sizes SET name = $3, value = $4, updated_at = now() \
             WHERE store_id = $1 AND id = $2 RETURNING {SIZE_COLUMNS}"
        ))
        .bind(store_id)
        .bind(id)
        .bind(&input.name)
        .bind(&input.value)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::classify(e, "Size already exist", "Store not exist"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a size.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the size does not exist.
    /// Returns `RepositoryError::Conflict` if products still use it.
    pub async fn delete(&self, store_id: StoreId, id: SizeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM sizes WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::classify(e, "Size already exist", "Size in use by a product"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
