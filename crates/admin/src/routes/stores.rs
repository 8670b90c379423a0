//! Store routes: create, list, rename and delete the signed-in user's stores.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::{info, instrument};

use storedesk_core::{Validated, ValidationErrors};

use crate::db::StoreRepository;
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::Store;
use crate::state::AppState;

use super::owned_store;

const MAX_NAME_CHARS: usize = 256;

/// Build the stores router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stores", get(list_stores).post(create_store))
        .route(
            "/api/stores/{store_id}",
            get(get_store).patch(rename_store).delete(delete_store),
        )
}

// =============================================================================
// API Types
// =============================================================================

/// Body for creating or renaming a store.
#[derive(Debug, Default, Deserialize)]
pub struct StoreRequest {
    pub name: Option<String>,
}

impl StoreRequest {
    /// # Errors
    ///
    /// Fails when the name is blank or longer than 256 characters.
    pub fn validate(self) -> Validated<String> {
        let mut errors = ValidationErrors::new();
        let name = errors.required_text("name", self.name.as_deref(), MAX_NAME_CHARS);
        errors.finish(|| name.unwrap_or_default())
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_stores(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Vec<Store>>, AppError> {
    let stores = StoreRepository::new(state.pool())
        .list_for_user(&user_id)
        .await?;
    Ok(Json(stores))
}

#[instrument(skip_all)]
async fn create_store(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Json(request): Json<StoreRequest>,
) -> Result<Json<Store>, AppError> {
    let name = request
        .validate()
        .map_err(|e| AppError::validation("Invalid store", e))?;

    let repo = StoreRepository::new(state.pool());
    if repo.find_by_name(&name).await?.is_some() {
        return Err(AppError::Conflict("Store already exist".to_string()));
    }

    let store = repo.create(&name, &user_id).await?;
    info!(store_id = %store.id, "Store created");

    Ok(Json(store))
}

async fn get_store(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(store_id): Path<String>,
) -> Result<Json<Store>, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    Ok(Json(store))
}

#[instrument(skip_all)]
async fn rename_store(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(store_id): Path<String>,
    Json(request): Json<StoreRequest>,
) -> Result<Json<Store>, AppError> {
    let name = request
        .validate()
        .map_err(|e| AppError::validation("Invalid store", e))?;
    let store = owned_store(&state, &store_id, &user_id).await?;

    if store.name == name {
        return Err(AppError::Conflict("Store name already updated".to_string()));
    }

    let store = StoreRepository::new(state.pool())
        .rename(store.id, &name)
        .await?;
    Ok(Json(store))
}

#[instrument(skip_all)]
async fn delete_store(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(store_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    StoreRepository::new(state.pool()).delete(store.id).await?;
    info!(store_id = %store.id, "Store deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_store_request_validation() {
        let name = StoreRequest {
            name: Some("  Corner Shop ".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(name, "Corner Shop");

        let err = StoreRequest::default().validate().unwrap_err();
        assert!(err.has_field("name"));

        let err = StoreRequest {
            name: Some("x".repeat(257)),
        }
        .validate()
        .unwrap_err();
        assert!(err.has_field("name"));
    }
}
