//! `PostgreSQL` implementation of the order ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use storedesk_core::{OrderId, ProductId, StoreId};

use super::{CheckoutProduct, OrderLedger, OrderSnapshot, PaymentConfirmation};
use crate::db::{RepositoryError, StoreRepository};
use crate::models::{Order, Store};

const ORDER_COLUMNS: &str = "id, store_id, made_payment, phone_no, address, created_at, updated_at";

/// Order ledger backed by the dashboard database.
#[derive(Debug, Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderLedger for PgLedger {
    async fn find_store(&self, store_id: StoreId) -> Result<Option<Store>, RepositoryError> {
        StoreRepository::new(&self.pool).get(store_id).await
    }

    async fn find_products(
        &self,
        store_id: StoreId,
        product_ids: &[ProductId],
    ) -> Result<Vec<CheckoutProduct>, RepositoryError> {
        let products = sqlx::query_as::<_, CheckoutProduct>(
            r"
            SELECT id, name, price
            FROM products
            WHERE store_id = $1 AND id = ANY($2) AND NOT is_archived
            ",
        )
        .bind(store_id)
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn recent_orders(
        &self,
        store_id: StoreId,
        product_ids: &[ProductId],
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<OrderSnapshot>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderSnapshot>(
            r"
            SELECT o.id, o.created_at,
                   COALESCE(
                       array_agg(oi.product_id) FILTER (WHERE oi.product_id IS NOT NULL),
                       '{}'::uuid[]
                   ) AS product_ids
            FROM orders o
            LEFT JOIN order_items oi
                   ON oi.order_id = o.id AND oi.product_id = ANY($2)
            WHERE o.store_id = $1
              AND (o.created_at IS NULL OR o.created_at > $3)
            GROUP BY o.id
            ORDER BY o.created_at DESC NULLS FIRST
            ",
        )
        .bind(store_id)
        .bind(product_ids)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    #[instrument(skip(self, product_ids), fields(items = product_ids.len()))]
    async fn create_pending_order(
        &self,
        store_id: StoreId,
        product_ids: &[ProductId],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (store_id, made_payment) VALUES ($1, false) RETURNING {ORDER_COLUMNS}"
        ))
        .bind(store_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO order_items (order_id, product_id) SELECT $1, unnest($2::uuid[])")
            .bind(order.id)
            .bind(product_ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                RepositoryError::classify(e, "Duplicate product in order", "Product not exist")
            })?;

        tx.commit().await?;

        Ok(order)
    }

    #[instrument(skip(self, confirmation))]
    async fn confirm_payment(
        &self,
        order_id: OrderId,
        confirmation: &PaymentConfirmation,
    ) -> Result<Option<Vec<ProductId>>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<OrderId> = sqlx::query_scalar(
            r"
            UPDATE orders
            SET made_payment = true, address = $2, phone_no = $3, updated_at = now()
            WHERE id = $1
            RETURNING id
            ",
        )
        .bind(order_id)
        .bind(&confirmation.address)
        .bind(&confirmation.phone)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let archived: Vec<ProductId> = sqlx::query_scalar(
            r"
            UPDATE products p
            SET is_archived = true, updated_at = now()
            FROM order_items oi
            WHERE oi.order_id = $1 AND p.id = oi.product_id
            RETURNING p.id
            ",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(archived))
    }
}
