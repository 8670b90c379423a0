//! Order table for the store owner.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::OrderSummary;
use crate::state::AppState;

use super::owned_store;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/{store_id}/orders", get(list_orders))
}

/// Orders newest first, each with its product names and formatted total.
async fn list_orders(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(store_id): Path<String>,
) -> Result<Json<Vec<OrderSummary>>, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let orders = OrderRepository::new(state.pool())
        .list_summaries(store.id)
        .await?;
    Ok(Json(orders))
}
