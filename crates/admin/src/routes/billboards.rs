//! Billboard routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use storedesk_core::{BillboardId, Validated, ValidationErrors};

use crate::db::{BillboardInput, BillboardRepository};
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::Billboard;
use crate::state::AppState;

use super::{find_store, owned_store, parse_id};

const MAX_LABEL_CHARS: usize = 256;

/// Build the billboards router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/{store_id}/billboards",
            get(list_billboards).post(create_billboard),
        )
        .route(
            "/api/{store_id}/billboards/{billboard_id}",
            get(get_billboard)
                .patch(update_billboard)
                .delete(delete_billboard),
        )
}

// =============================================================================
// API Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillboardRequest {
    pub label: Option<String>,
    pub image_url: Option<String>,
}

impl BillboardRequest {
    /// # Errors
    ///
    /// Fails on a blank or overlong label, or an image URL that is not http(s).
    pub fn validate(self) -> Validated<BillboardInput> {
        let mut errors = ValidationErrors::new();
        let label = errors.required_text("label", self.label.as_deref(), MAX_LABEL_CHARS);
        let image_url = errors.url("imageUrl", self.image_url.as_deref());
        errors.finish(|| BillboardInput {
            label: label.unwrap_or_default(),
            image_url: image_url.map(String::from).unwrap_or_default(),
        })
    }
}

fn invalid(errors: ValidationErrors) -> AppError {
    AppError::validation("Invalid billboard", errors)
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_billboards(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
) -> Result<Json<Vec<Billboard>>, AppError> {
    let store = find_store(&state, &store_id).await?;
    let billboards = BillboardRepository::new(state.pool()).list(store.id).await?;
    Ok(Json(billboards))
}

async fn get_billboard(
    State(state): State<AppState>,
    Path((store_id, billboard_id)): Path<(String, String)>,
) -> Result<Json<Billboard>, AppError> {
    let store = find_store(&state, &store_id).await?;
    let id: BillboardId = parse_id(&billboard_id, "billboard")?;
    BillboardRepository::new(state.pool())
        .get(store.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Billboard not exist".to_string()))
}

#[instrument(skip_all)]
async fn create_billboard(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(store_id): Path<String>,
    Json(request): Json<BillboardRequest>,
) -> Result<Json<Billboard>, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let input = request.validate().map_err(invalid)?;

    let billboard = BillboardRepository::new(state.pool())
        .create(store.id, &input)
        .await?;
    Ok(Json(billboard))
}

#[instrument(skip_all)]
async fn update_billboard(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path((store_id, billboard_id)): Path<(String, String)>,
    Json(request): Json<BillboardRequest>,
) -> Result<Json<Billboard>, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let id: BillboardId = parse_id(&billboard_id, "billboard")?;
    let input = request.validate().map_err(invalid)?;

    let repo = BillboardRepository::new(state.pool());
    let existing = repo
        .get(store.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Billboard not exist".to_string()))?;
    if input.matches(&existing) {
        return Err(AppError::Conflict("Billboard already updated".to_string()));
    }

    Ok(Json(repo.update(store.id, id, &input).await?))
}

#[instrument(skip_all)]
async fn delete_billboard(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path((store_id, billboard_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let id: BillboardId = parse_id(&billboard_id, "billboard")?;
    BillboardRepository::new(state.pool())
        .delete(store.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
