//! Order read models for the dashboard: the order table and revenue stats.
//!
//! Order creation and payment confirmation live in the ledger
//! ([`crate::ledger::PgLedger`]); this module only reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use storedesk_core::{OrderId, StoreId};

use super::RepositoryError;
use crate::models::OrderSummary;
use crate::models::order::format_usd;

const MONTH_LABELS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Revenue for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphPoint {
    pub name: &'static str,
    pub total: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    id: OrderId,
    made_payment: bool,
    phone_no: String,
    address: String,
    product_names: Option<String>,
    total_price: Option<Decimal>,
    created_at: Option<DateTime<Utc>>,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            id: row.id,
            phone: row.phone_no,
            address: row.address,
            products: row.product_names.unwrap_or_default(),
            total_price: format_usd(row.total_price.unwrap_or(Decimal::ZERO)),
            is_paid: row.made_payment,
            created_at: row.created_at,
        }
    }
}

/// Repository for dashboard order queries.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a store's orders with product names and totals, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_summaries(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            r"
            SELECT o.id, o.made_payment, o.phone_no, o.address, o.created_at,
                   string_agg(p.name, ', ' ORDER BY p.name) AS product_names,
                   sum(p.price) AS total_price
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            LEFT JOIN products p ON p.id = oi.product_id
            WHERE o.store_id = $1
            GROUP BY o.id
            ORDER BY o.created_at DESC NULLS FIRST
            ",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    /// Sum of product prices across paid orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_revenue(&self, store_id: StoreId) -> Result<Decimal, RepositoryError> {
        let total: Option<Decimal> = sqlx::query_scalar(
            r"
            SELECT sum(p.price)
            FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            JOIN products p ON p.id = oi.product_id
            WHERE o.store_id = $1 AND o.made_payment
            ",
        )
        .bind(store_id)
        .fetch_one(self.pool)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }

    /// Number of paid orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sales_count(&self, store_id: StoreId) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT count(*) FROM orders WHERE store_id = $1 AND made_payment")
                .bind(store_id)
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    /// Number of products still for sale.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stock_count(&self, store_id: StoreId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM products WHERE store_id = $1 AND NOT is_archived",
        )
        .bind(store_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Paid revenue grouped by calendar month (all years folded together).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn monthly_revenue(&self, store_id: StoreId) -> Result<Vec<GraphPoint>, RepositoryError> {
        let rows: Vec<(i32, Decimal)> = sqlx::query_as(
            r"
            SELECT EXTRACT(MONTH FROM o.created_at)::int4 AS month, sum(p.price) AS total
            FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            JOIN products p ON p.id = oi.product_id
            WHERE o.store_id = $1 AND o.made_payment AND o.created_at IS NOT NULL
            GROUP BY month
            ",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(monthly_buckets(&rows))
    }
}

/// Spread `(month, total)` pairs over twelve `JAN..DEC` buckets.
///
/// Months outside `1..=12` are ignored; missing months total zero.
#[must_use]
pub fn monthly_buckets(rows: &[(i32, Decimal)]) -> Vec<GraphPoint> {
    let mut totals = [Decimal::ZERO; 12];
    for &(month, total) in rows {
        let slot = usize::try_from(month)
            .ok()
            .and_then(|m| m.checked_sub(1))
            .and_then(|i| totals.get_mut(i));
        if let Some(slot) = slot {
            *slot += total;
        }
    }

    MONTH_LABELS
        .iter()
        .zip(totals)
        .map(|(&name, total)| GraphPoint { name, total })
        .collect()
}
