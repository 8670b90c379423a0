//! Billboard repository.

use sqlx::PgPool;

use storedesk_core::{BillboardId, StoreId};

use super::RepositoryError;
use crate::models::Billboard;

const BILLBOARD_COLUMNS: &str = "id, store_id, label, image_url, created_at, updated_at";

/// Billboard fields supplied on create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillboardInput {
    pub label: String,
    pub image_url: String,
}

impl BillboardInput {
    /// Whether applying this input would leave `billboard` unchanged.
    #[must_use]
    pub fn matches(&self, billboard: &Billboard) -> bool {
        self.label == billboard.label && self.image_url == billboard.image_url
    }
}

/// Repository for billboard database operations.
pub struct BillboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BillboardRepository<'a> {
    /// Create a new billboard repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a store's billboards, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, store_id: StoreId) -> Result<Vec<Billboard>, RepositoryError> {
        let rows = sqlx::query_as::<_, Billboard>(&format!(
            "SELECT {BILLBOARD_COLUMNS} FROM billboards WHERE store_id = $1 ORDER BY created_at ASC"
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get one of a store's billboards.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        store_id: StoreId,
        id: BillboardId,
    ) -> Result<Option<Billboard>, RepositoryError> {
        let row = sqlx::query_as::<_, Billboard>(&format!(
            "SELECT {BILLBOARD_COLUMNS} FROM billboards WHERE store_id = $1 AND id = $2"
        ))
        .bind(store_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a billboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        store_id: StoreId,
        input: &BillboardInput,
    ) -> Result<Billboard, RepositoryError> {
        sqlx::query_as::<_, Billboard>(&format!(
            "INSERT INTO billboards (store_id, label, image_url) VALUES ($1, $2, $3) \
             RETURNING {BILLBOARD_COLUMNS}"
        ))
        .bind(store_id)
        .bind(&input.label)
        .bind(&input.image_url)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::classify(e, "Billboard already exist", "Store not exist"))
    }

    /// Replace a billboard's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the billboard does not exist.
    pub async fn update(
        &self,
        store_id: StoreId,
        id: BillboardId,
        input: &BillboardInput,
    ) -> Result<Billboard, RepositoryError> {
        sqlx::query_as::<_, Billboard>(&format!(
            "UPDATE billboards SET label = $3, image_url = $4, updated_at = now() \
             WHERE store_id = $1 AND id = $2 RETURNING {BILLBOARD_COLUMNS}"
        ))
        .bind(store_id)
        .bind(id)
        .bind(&input.label)
        .bind(&input.image_url)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a billboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the billboard does not exist.
    /// Returns `RepositoryError::Conflict` if a category still uses it.
    pub async fn delete(&self, store_id: StoreId, id: BillboardId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM billboards WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::classify(e, "Billboard already exist", "Billboard in use by a category")
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
