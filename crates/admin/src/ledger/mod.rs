//! Order ledger: the persistence seam for checkout and payment reconciliation.
//!
//! The ledger owns orders and their items. Checkout asks it which products
//! are sellable, which recent orders might be duplicates, and to record a
//! pending order; the payment webhook asks it to mark an order paid and
//! withdraw the purchased products from sale.
//!
//! Both multi-row writes are atomic: [`OrderLedger::create_pending_order`]
//! inserts the order and all of its items in one transaction, and
//! [`OrderLedger::confirm_payment`] updates the order and archives its
//! products in one transaction.

mod postgres;

#[cfg(any(test, feature = "test-support"))]
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use storedesk_core::{OrderId, Price, ProductId, StoreId};

use crate::db::RepositoryError;
use crate::models::{Order, Store};

pub use postgres::PgLedger;

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryLedger;

/// A product that can be put into a checkout session.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CheckoutProduct {
    pub id: ProductId,
    pub name: String,
    /// Price captured at checkout time; reconciliation never re-reads it.
    pub price: Price,
}

/// A prior order as seen by the duplicate-order check.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderSnapshot {
    pub id: OrderId,
    pub created_at: Option<DateTime<Utc>>,
    /// The order's items, restricted to the product ids being checked out.
    pub product_ids: Vec<ProductId>,
}

/// Customer details reported by the payment provider on completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentConfirmation {
    /// Joined postal address, empty when none was reported.
    pub address: String,
    /// Phone number, empty when none was reported.
    pub phone: String,
}

/// Persistence operations behind checkout and reconciliation.
#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Look up a store.
    async fn find_store(&self, store_id: StoreId) -> Result<Option<Store>, RepositoryError>;

    /// Resolve product ids to sellable products of `store_id`.
    ///
    /// Ids that do not exist, belong to another store, or are archived are
    /// left out of the result.
    async fn find_products(
        &self,
        store_id: StoreId,
        product_ids: &[ProductId],
    ) -> Result<Vec<CheckoutProduct>, RepositoryError>;

    /// Orders of `store_id` created after `cutoff` or with no creation
    /// timestamp, newest first, with items restricted to `product_ids`.
    async fn recent_orders(
        &self,
        store_id: StoreId,
        product_ids: &[ProductId],
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<OrderSnapshot>, RepositoryError>;

    /// Insert a pending order and one item per product, atomically.
    ///
    /// Fails with [`RepositoryError::Conflict`] if `product_ids` repeats an id.
    async fn create_pending_order(
        &self,
        store_id: StoreId,
        product_ids: &[ProductId],
    ) -> Result<Order, RepositoryError>;

    /// Mark an order paid, store the customer details and archive every
    /// product on the order, atomically.
    ///
    /// Returns the archived product ids, or `None` if the order does not
    /// exist. Applying the same confirmation twice leaves the same state.
    async fn confirm_payment(
        &self,
        order_id: OrderId,
        confirmation: &PaymentConfirmation,
    ) -> Result<Option<Vec<ProductId>>, RepositoryError>;
}
