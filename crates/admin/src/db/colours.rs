//! Colour repository.

use sqlx::PgPool;

use storedesk_core::{ColourId, StoreId};

use super::RepositoryError;
use crate::models::Colour;

const COLOUR_COLUMNS: &str = "id, store_id, name, value, created_at, updated_at";

/// Colour fields supplied on create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColourInput {
    pub name: String,
    pub value: String,
}

impl ColourInput {
    /// Whether applying this input would leave `colour` unchanged.
    #[must_use]
    pub fn matches(&self, colour: &Colour) -> bool {
        self.name == colour.name && self.value == colour.value
    }
}

/// Repository for colour database operations.
pub struct ColourRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ColourRepository<'a> {
    /// Create a new colour repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a store's colours, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, store_id: StoreId) -> Result<Vec<Colour>, RepositoryError> {
        let rows = sqlx::query_as::<_, Colour>(&format!(
            "SELECT {COLOUR_COLUMNS} FROM colours WHERE store_id = $1 ORDER BY created_at ASC"
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get one of a store's colours.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, store_id: StoreId, id: ColourId) -> Result<Option<Colour>, RepositoryError> {
        let row = sqlx::query_as::<_, Colour>(&format!(
            "SELECT {COLOUR_COLUMNS} FROM colours WHERE store_id = $1 AND id = $2"
        ))
        .bind(store_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a colour.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the store already has a colour
    /// with this name.
    pub async fn create(&self, store_id: StoreId, input: &ColourInput) -> Result<Colour, RepositoryError> {
        sqlx::query_as::<_, Colour>(&format!(
            "INSERT INTO colours (store_id, name, value) VALUES ($1, $2, $3) RETURNING {COLOUR_COLUMNS}"
        ))
        .bind(store_id)
        .bind(&input.name)
        .bind(&input.value)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::classify(e, "Colour already exist", "Store not exist"))
    }

    /// Replace a colour's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the colour does not exist.
    /// Returns `RepositoryError::Conflict` if the new name is taken.
    pub async fn update(
        &self,
        store_id: StoreId,
        id: ColourId,
        input: &ColourInput,
    ) -> Result<Colour, RepositoryError> {
        sqlx::query_as::<_, Colour>(&format!(
            "UPDATE colours SET name = $3, value = $4, updated_at = now() \
             WHERE store_id = $1 AND id = $2 RETURNING {COLOUR_COLUMNS}"
        ))
        .bind(store_id)
        .bind(id)
        .bind(&input.name)
        .bind(&input.value)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::classify(e, "Colour already exist", "Store not exist"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a colour.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the colour does not exist.
    /// Returns `RepositoryError::Conflict` if products still use it.
    pub async fn delete(&self, store_id: StoreId, id: ColourId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM colours WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::classify(e, "Colour already exist", "Colour in use by a product"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
