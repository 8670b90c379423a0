//! Storefront checkout endpoint.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;

use storedesk_core::StoreId;

use crate::error::AppError;
use crate::middleware::checkout_cors;
use crate::services::{CheckoutOutcome, CheckoutRequest};
use crate::state::AppState;

use super::parse_id;

/// Build the checkout router (with its own open CORS policy).
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/{store_id}/checkout",
            post(create_checkout).options(preflight),
        )
        .layer(checkout_cors())
}

/// Turn a cart into a pending order and return the payment page URL.
///
/// The store id is checked before the body is looked at.
async fn create_checkout(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutOutcome>, AppError> {
    parse_id::<StoreId>(&store_id, "store")?;
    let Json(request) = body?;

    let outcome = state
        .checkout()
        .checkout(&store_id, request, Utc::now())
        .await?;
    Ok(Json(outcome))
}

/// Preflight requests that reach the handler get an empty success.
async fn preflight() -> impl IntoResponse {
    StatusCode::OK
}
