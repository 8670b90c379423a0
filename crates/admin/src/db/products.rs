//! Product repository.
//!
//! Products are always served with the display names of their category,
//! size and colour and with their images, so reads go through
//! [`ProductView`]. Writes that touch both `products` and `images` run in a
//! single transaction.

use std::collections::HashMap;

use sqlx::PgPool;

use storedesk_core::{CategoryId, ColourId, Price, ProductId, SizeId, StoreId};

use super::RepositoryError;
use crate::models::{Image, Product, ProductView};

const PRODUCT_VIEW_SELECT: &str = r"
    SELECT p.id, p.store_id, p.category_id, p.size_id, p.colour_id, p.name, p.price,
           p.is_featured, p.is_archived, p.created_at, p.updated_at,
           c.name AS category, s.name AS size, co.value AS colour, co.name AS colour_name
    FROM products p
    JOIN categories c ON c.id = p.category_id
    JOIN sizes s ON s.id = p.size_id
    JOIN colours co ON co.id = p.colour_id
";

const PRODUCT_COLUMNS: &str = "id, store_id, category_id, size_id, colour_id, name, price, \
                               is_featured, is_archived, created_at, updated_at";

/// Product fields supplied on create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub price: Price,
    pub category_id: CategoryId,
    pub size_id: SizeId,
    pub colour_id: ColourId,
    pub is_featured: bool,
    pub is_archived: bool,
    /// Image URLs in display order. Never empty.
    pub image_urls: Vec<String>,
}

impl ProductInput {
    /// Whether applying this input would leave `view` unchanged.
    #[must_use]
    pub fn matches(&self, view: &ProductView) -> bool {
        let product = &view.product;
        let mut current: Vec<&str> = view.images.iter().map(|i| i.url.as_str()).collect();
        let mut requested: Vec<&str> = self.image_urls.iter().map(String::as_str).collect();
        current.sort_unstable();
        requested.sort_unstable();

        self.name == product.name
            && self.price == product.price
            && self.category_id == product.category_id
            && self.size_id == product.size_id
            && self.colour_id == product.colour_id
            && self.is_featured == product.is_featured
            && self.is_archived == product.is_archived
            && current == requested
    }
}

/// Optional filters for listing products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub size_id: Option<SizeId>,
    pub colour_id: Option<ColourId>,
    pub is_featured: Option<bool>,
    /// Archived products are hidden unless this is `true`.
    pub is_archived: bool,
    /// Leave one product out (used for "you may also like" lists).
    pub exclude_id: Option<ProductId>,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductViewRow {
    #[sqlx(flatten)]
    product: Product,
    category: String,
    size: String,
    colour: String,
    colour_name: String,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a store's products matching `filter`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        store_id: StoreId,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductView>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductViewRow>(&format!(
            "{PRODUCT_VIEW_SELECT}
             WHERE p.store_id = $1
               AND ($2::uuid IS NULL OR p.category_id = $2)
               AND ($3::uuid IS NULL OR p.size_id = $3)
               AND ($4::uuid IS NULL OR p.colour_id = $4)
               AND ($5::bool IS NULL OR p.is_featured = $5)
               AND p.is_archived = $6
               AND ($7::uuid IS NULL OR p.id <> $7)
             ORDER BY p.created_at ASC"
        ))
        .bind(store_id)
        .bind(filter.category_id)
        .bind(filter.size_id)
        .bind(filter.colour_id)
        .bind(filter.is_featured)
        .bind(filter.is_archived)
        .bind(filter.exclude_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_images(rows).await
    }

    /// Get one of a store's products with its images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(
        &self,
        store_id: StoreId,
        id: ProductId,
    ) -> Result<Option<ProductView>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductViewRow>(&format!(
            "{PRODUCT_VIEW_SELECT} WHERE p.store_id = $1 AND p.id = $2"
        ))
        .bind(store_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.attach_images(vec![row]).await?.pop())
    }

    /// Create a product and its images in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a referenced category, size or
    /// colour disappeared concurrently.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        store_id: StoreId,
        input: &ProductInput,
    ) -> Result<ProductView, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products
                 (store_id, category_id, size_id, colour_id, name, price, is_featured, is_archived)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(store_id)
        .bind(input.category_id)
        .bind(input.size_id)
        .bind(input.colour_id)
        .bind(&input.name)
        .bind(input.price)
        .bind(input.is_featured)
        .bind(input.is_archived)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            RepositoryError::classify(e, "Product already exist", "Category, size or colour not exist")
        })?;

        sqlx::query("INSERT INTO images (product_id, url) SELECT $1, unnest($2::text[])")
            .bind(product.id)
            .bind(&input.image_urls)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(product_id = %product.id, store_id = %store_id, "Product created");

        self.get(store_id, product.id)
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption("created product vanished".to_owned()))
    }

    /// Replace a product's fields and sync its images in one transaction.
    ///
    /// Images whose URL is no longer listed are removed; new URLs are added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        store_id: StoreId,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<ProductView, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE products
             SET category_id = $3, size_id = $4, colour_id = $5, name = $6, price = $7,
                 is_featured = $8, is_archived = $9, updated_at = now()
             WHERE store_id = $1 AND id = $2",
        )
        .bind(store_id)
        .bind(id)
        .bind(input.category_id)
        .bind(input.size_id)
        .bind(input.colour_id)
        .bind(&input.name)
        .bind(input.price)
        .bind(input.is_featured)
        .bind(input.is_archived)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            RepositoryError::classify(e, "Product already exist", "Category, size or colour not exist")
        })?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM images WHERE product_id = $1 AND url <> ALL($2::text[])")
            .bind(id)
            .bind(&input.image_urls)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO images (product_id, url)
             SELECT $1, u FROM unnest($2::text[]) AS u
             WHERE NOT EXISTS (SELECT 1 FROM images WHERE product_id = $1 AND url = u)",
        )
        .bind(id)
        .bind(&input.image_urls)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get(store_id, id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product; its images cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, store_id: StoreId, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn attach_images(
        &self,
        rows: Vec<ProductViewRow>,
    ) -> Result<Vec<ProductView>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<ProductId> = rows.iter().map(|r| r.product.id).collect();
        let images = sqlx::query_as::<_, Image>(
            "SELECT id, product_id, url, created_at, updated_at
             FROM images WHERE product_id = ANY($1) ORDER BY created_at ASC, id ASC",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_product: HashMap<ProductId, Vec<Image>> = HashMap::new();
        for image in images {
            by_product.entry(image.product_id).or_default().push(image);
        }

        Ok(rows
            .into_iter()
            .map(|row| ProductView {
                images: by_product.remove(&row.product.id).unwrap_or_default(),
                product: row.product,
                category: row.category,
                size: row.size,
                colour: row.colour,
                colour_name: row.colour_name,
            })
            .collect())
    }
}
