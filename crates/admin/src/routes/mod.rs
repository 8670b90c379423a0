//! HTTP route handlers for the dashboard API.
//!
//! # Route Structure
//!
//! ```text
//! # Checkout (open CORS, storefront clients)
//! POST    /api/{store_id}/checkout              - Create pending order + payment session
//! OPTIONS /api/{store_id}/checkout              - Preflight
//!
//! # Payment provider
//! POST    /api/webhook                          - Signed payment events
//!
//! # Stores (owner)
//! GET     /api/stores                           - Stores of the signed-in user
//! POST    /api/stores                           - Create store
//! GET     /api/stores/{store_id}                - Store detail
//! PATCH   /api/stores/{store_id}                - Rename store
//! DELETE  /api/stores/{store_id}                - Delete store and its catalog
//!
//! # Catalog (public reads, owner writes)
//! GET|POST         /api/{store_id}/billboards[/{billboard_id}]
//! GET|POST         /api/{store_id}/categories[/{category_id}]
//! GET|POST         /api/{store_id}/sizes[/{size_id}]
//! GET|POST         /api/{store_id}/colours[/{colour_id}]
//! GET|POST         /api/{store_id}/products[/{product_id}]
//! PATCH|DELETE     (on the item routes)
//!
//! # Reporting (owner)
//! GET     /api/{store_id}/orders                - Orders with products and totals
//! GET     /api/{store_id}/dashboard             - Revenue, sales, stock, monthly graph
//! ```

use std::str::FromStr;

use axum::Router;

use storedesk_core::StoreId;

use crate::db::StoreRepository;
use crate::error::AppError;
use crate::models::Store;
use crate::state::AppState;

pub mod billboards;
pub mod categories;
pub mod checkout;
pub mod colours;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod sizes;
pub mod stores;
pub mod webhook;

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(checkout::router())
        .merge(webhook::router())
        .merge(stores::router())
        .merge(billboards::router())
        .merge(categories::router())
        .merge(sizes::router())
        .merge(colours::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(dashboard::router())
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Parse a path segment into a typed id, answering 400 on failure.
pub(crate) fn parse_id<T: FromStr>(raw: &str, kind: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {kind} Id type")))
}

/// Resolve a store id from the path, answering 404 when no such store exists.
pub(crate) async fn find_store(state: &AppState, raw: &str) -> Result<Store, AppError> {
    let store_id: StoreId = parse_id(raw, "store")?;
    StoreRepository::new(state.pool())
        .get(store_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Store not exist".to_string()))
}

/// Resolve a store and require that `user_id` owns it.
pub(crate) async fn owned_store(
    state: &AppState,
    raw: &str,
    user_id: &str,
) -> Result<Store, AppError> {
    let store = find_store(state, raw).await?;
    if !store.is_owned_by(user_id) {
        tracing::warn!(store_id = %store.id, "Store access denied");
        return Err(AppError::unauthorized());
    }
    Ok(store)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storedesk_core::ProductId;

    use super::*;

    #[test]
    fn test_parse_id_message() {
        let err = parse_id::<ProductId>("nope", "product").unwrap_err();
        assert_eq!(err.to_string(), "Invalid product Id type");
        assert!(parse_id::<ProductId>(&ProductId::generate().to_string(), "product").is_ok());
    }
}
