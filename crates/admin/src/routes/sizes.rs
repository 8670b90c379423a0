//! Size routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use storedesk_core::{SizeId, Validated, ValidationErrors};

use crate::db::{SizeInput, SizeRepository};
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::Size;
use crate::state::AppState;

use super::{find_store, owned_store, parse_id};

const MAX_NAME_CHARS: usize = 64;
const MAX_VALUE_CHARS: usize = 64;

/// Build the sizes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/{store_id}/sizes", get(list_sizes).post(create_size))
        .route(
            "/api/{store_id}/sizes/{size_id}",
            get(get_size).patch(update_size).delete(delete_size),
        )
}

// =============================================================================
// API Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct SizeRequest {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl SizeRequest {
    /// # Errors
    ///
    /// Fails when the name or value is blank or longer than 64 characters.
    pub fn validate(self) -> Validated<SizeInput> {
        let mut errors = ValidationErrors::new();
        let name = errors.required_text("name", self.name.as_deref(), MAX_NAME_CHARS);
        let value = errors.required_text("value", self.value.as_deref(), MAX_VALUE_CHARS);
        errors.finish(|| SizeInput {
            name: name.unwrap_or_default(),
            value: value.unwrap_or_default(),
        })
    }
}

fn invalid(errors: ValidationErrors) -> AppError {
    AppError::validation("Invalid size", errors)
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_sizes(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
) -> Result<Json<Vec<Size>>, AppError> {
    let store = find_store(&state, &store_id).await?;
    let sizes = SizeRepository::new(state.pool()).list(store.id).await?;
    Ok(Json(sizes))
}

async fn get_size(
    State(state): State<AppState>,
    Path((store_id, size_id)): Path<(String, String)>,
) -> Result<Json<Size>, AppError> {
    let store = find_store(&state, &store_id).await?;
    let id: SizeId = parse_id(&size_id, "size")?;
    SizeRepository::new(state.pool())
        .get(store.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Size not exist".to_string()))
}

#[instrument(skip_all)]
async fn create_size(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(store_id): Path<String>,
    Json(request): Json<SizeRequest>,
) -> Result<Json<Size>, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let input = request.validate().map_err(invalid)?;

    let size = SizeRepository::new(state.pool())
        .create(store.id, &input)
        .await?;
    Ok(Json(size))
}

#[instrument(skip_all)]
async fn update_size(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path((store_id, size_id)): Path<(String, String)>,
    Json(request): Json<SizeRequest>,
) -> Result<Json<Size>, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let id: SizeId = parse_id(&size_id, "size")?;
    let input = request.validate().map_err(invalid)?;

    let repo = SizeRepository::new(state.pool());
    let existing = repo
        .get(store.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Size not exist".to_string()))?;
    if input.matches(&existing) {
        return Err(AppError::Conflict("Size already updated".to_string()));
    }

    Ok(Json(repo.update(store.id, id, &input).await?))
}

#[instrument(skip_all)]
async fn delete_size(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path((store_id, size_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let id: SizeId = parse_id(&size_id, "size")?;
    SizeRepository::new(state.pool()).delete(store.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_size_request_validation() {
        let input = SizeRequest {
            name: Some("Large".to_string()),
            value: Some(" L ".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(input.value, "L");

        let err = SizeRequest {
            name: Some(String::new()),
            value: Some("x".repeat(65)),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.len(), 2);
    }
}
