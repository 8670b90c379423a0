//! In-memory order ledger for router and service tests.
//!
//! Mirrors the `PostgreSQL` semantics that matter to checkout: products are
//! scoped to a store, archived products are not sellable, and an order may
//! not hold the same product twice.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use storedesk_core::{OrderId, OrderItemId, Price, ProductId, StoreId};

use super::{CheckoutProduct, OrderLedger, OrderSnapshot, PaymentConfirmation};
use crate::db::RepositoryError;
use crate::models::{Order, OrderItem, Store};

#[derive(Debug, Clone)]
struct MemoryProduct {
    store_id: StoreId,
    name: String,
    price: Price,
    is_archived: bool,
}

#[derive(Debug, Default)]
struct Inner {
    stores: HashMap<StoreId, Store>,
    products: HashMap<ProductId, MemoryProduct>,
    orders: Vec<Order>,
    items: Vec<OrderItem>,
}

/// Order ledger held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a store owned by `user_id`.
    pub async fn insert_store(&self, name: &str, user_id: &str) -> Store {
        let now = Utc::now();
        let store = Store {
            id: StoreId::generate(),
            name: name.to_owned(),
            user_id: user_id.to_owned(),
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().await.stores.insert(store.id, store.clone());
        store
    }

    /// Add a sellable product to a store.
    pub async fn insert_product(&self, store_id: StoreId, name: &str, price: Price) -> ProductId {
        let id = ProductId::generate();
        self.inner.lock().await.products.insert(
            id,
            MemoryProduct {
                store_id,
                name: name.to_owned(),
                price,
                is_archived: false,
            },
        );
        id
    }

    /// Whether a product has been withdrawn from sale. `None` if unknown.
    pub async fn is_archived(&self, product_id: ProductId) -> Option<bool> {
        self.inner
            .lock()
            .await
            .products
            .get(&product_id)
            .map(|p| p.is_archived)
    }

    pub async fn order(&self, order_id: OrderId) -> Option<Order> {
        self.inner
            .lock()
            .await
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
    }

    /// All orders of a store, in insertion order.
    pub async fn orders(&self, store_id: StoreId) -> Vec<Order> {
        self.inner
            .lock()
            .await
            .orders
            .iter()
            .filter(|o| o.store_id == store_id)
            .cloned()
            .collect()
    }

    pub async fn order_items(&self, order_id: OrderId) -> Vec<OrderItem> {
        self.inner
            .lock()
            .await
            .items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect()
    }

    /// Total number of order items across all orders.
    pub async fn item_count(&self) -> usize {
        self.inner.lock().await.items.len()
    }

    /// Overwrite an order's creation time (to age it or blank it out).
    pub async fn set_order_created_at(&self, order_id: OrderId, created_at: Option<DateTime<Utc>>) {
        if let Some(order) = self
            .inner
            .lock()
            .await
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
        {
            order.created_at = created_at;
        }
    }
}

#[async_trait]
impl OrderLedger for MemoryLedger {
    async fn find_store(&self, store_id: StoreId) -> Result<Option<Store>, RepositoryError> {
        Ok(self.inner.lock().await.stores.get(&store_id).cloned())
    }

    async fn find_products(
        &self,
        store_id: StoreId,
        product_ids: &[ProductId],
    ) -> Result<Vec<CheckoutProduct>, RepositoryError> {
        let inner = self.inner.lock().await;
        let wanted: HashSet<&ProductId> = product_ids.iter().collect();

        Ok(inner
            .products
            .iter()
            .filter(|(id, p)| wanted.contains(id) && p.store_id == store_id && !p.is_archived)
            .map(|(id, p)| CheckoutProduct {
                id: *id,
                name: p.name.clone(),
                price: p.price,
            })
            .collect())
    }

    async fn recent_orders(
        &self,
        store_id: StoreId,
        product_ids: &[ProductId],
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<OrderSnapshot>, RepositoryError> {
        let inner = self.inner.lock().await;

        let mut snapshots: Vec<OrderSnapshot> = inner
            .orders
            .iter()
            .filter(|o| o.store_id == store_id)
            .filter(|o| o.created_at.is_none_or(|at| at > cutoff))
            .map(|o| OrderSnapshot {
                id: o.id,
                created_at: o.created_at,
                product_ids: inner
                    .items
                    .iter()
                    .filter(|i| i.order_id == o.id && product_ids.contains(&i.product_id))
                    .map(|i| i.product_id)
                    .collect(),
            })
            .collect();

        // Newest first, undated orders ahead of everything.
        snapshots.sort_by(|a, b| match (a.created_at, b.created_at) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(x), Some(y)) => y.cmp(&x),
        });
        Ok(snapshots)
    }

    async fn create_pending_order(
        &self,
        store_id: StoreId,
        product_ids: &[ProductId],
    ) -> Result<Order, RepositoryError> {
        let mut inner = self.inner.lock().await;

        let mut seen = HashSet::new();
        if !product_ids.iter().all(|id| seen.insert(*id)) {
            return Err(RepositoryError::Conflict("Duplicate product in order".to_owned()));
        }
        if product_ids.iter().any(|id| !inner.products.contains_key(id)) {
            return Err(RepositoryError::Conflict("Product not exist".to_owned()));
        }

        let now = Utc::now();
        let order = Order {
            id: OrderId::generate(),
            store_id,
            made_payment: false,
            phone_no: String::new(),
            address: String::new(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        inner.orders.push(order.clone());
        inner.items.extend(product_ids.iter().map(|&product_id| OrderItem {
            id: OrderItemId::generate(),
            order_id: order.id,
            product_id,
        }));

        Ok(order)
    }

    async fn confirm_payment(
        &self,
        order_id: OrderId,
        confirmation: &PaymentConfirmation,
    ) -> Result<Option<Vec<ProductId>>, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let Inner {
            orders,
            items,
            products,
            ..
        } = &mut *inner;

        let Some(order) = orders.iter_mut().find(|o| o.id == order_id) else {
            return Ok(None);
        };
        order.made_payment = true;
        order.address.clone_from(&confirmation.address);
        order.phone_no.clone_from(&confirmation.phone);
        order.updated_at = Some(Utc::now());

        let archived: Vec<ProductId> = items
            .iter()
            .filter(|i| i.order_id == order_id)
            .map(|i| i.product_id)
            .collect();
        for id in &archived {
            if let Some(product) = products.get_mut(id) {
                product.is_archived = true;
            }
        }

        Ok(Some(archived))
    }
}
