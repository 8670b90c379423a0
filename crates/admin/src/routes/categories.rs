//! Category routes. Every category hangs off one of the store's billboards.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use storedesk_core::{BillboardId, CategoryId, StoreId, Validated, ValidationErrors};

use crate::db::{BillboardRepository, CategoryInput, CategoryRepository};
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::Category;
use crate::state::AppState;

use super::{find_store, owned_store, parse_id};

const MAX_NAME_CHARS: usize = 256;

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/{store_id}/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/api/{store_id}/categories/{category_id}",
            get(get_category)
                .patch(update_category)
                .delete(delete_category),
        )
}

// =============================================================================
// API Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub billboard_id: Option<String>,
}

impl CategoryRequest {
    /// # Errors
    ///
    /// Fails on a blank or overlong name, or a billboard id that is not a UUID.
    pub fn validate(self) -> Validated<CategoryInput> {
        let mut errors = ValidationErrors::new();
        let name = errors.required_text("name", self.name.as_deref(), MAX_NAME_CHARS);
        let billboard_id: Option<BillboardId> =
            errors.uuid("billboardId", self.billboard_id.as_deref());
        match (name, billboard_id) {
            (Some(name), Some(billboard_id)) if errors.is_empty() => {
                Ok(CategoryInput { name, billboard_id })
            }
            _ => Err(errors),
        }
    }
}

fn invalid(errors: ValidationErrors) -> AppError {
    AppError::validation("Invalid category", errors)
}

/// The referenced billboard must belong to the same store.
async fn ensure_billboard(
    state: &AppState,
    store_id: StoreId,
    billboard_id: BillboardId,
) -> Result<(), AppError> {
    BillboardRepository::new(state.pool())
        .get(store_id, billboard_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::Unprocessable("Billboard not exist".to_string()))
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_categories(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
) -> Result<Json<Vec<Category>>, AppError> {
    let store = find_store(&state, &store_id).await?;
    let categories = CategoryRepository::new(state.pool()).list(store.id).await?;
    Ok(Json(categories))
}

async fn get_category(
    State(state): State<AppState>,
    Path((store_id, category_id)): Path<(String, String)>,
) -> Result<Json<Category>, AppError> {
    let store = find_store(&state, &store_id).await?;
    let id: CategoryId = parse_id(&category_id, "category")?;
    CategoryRepository::new(state.pool())
        .get(store.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not exist".to_string()))
}

#[instrument(skip_all)]
async fn create_category(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(store_id): Path<String>,
    Json(request): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let input = request.validate().map_err(invalid)?;
    ensure_billboard(&state, store.id, input.billboard_id).await?;

    let category = CategoryRepository::new(state.pool())
        .create(store.id, &input)
        .await?;
    Ok(Json(category))
}

#[instrument(skip_all)]
async fn update_category(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path((store_id, category_id)): Path<(String, String)>,
    Json(request): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let id: CategoryId = parse_id(&category_id, "category")?;
    let input = request.validate().map_err(invalid)?;

    let repo = CategoryRepository::new(state.pool());
    let existing = repo
        .get(store.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not exist".to_string()))?;
    if input.matches(&existing) {
        return Err(AppError::Conflict("Category already updated".to_string()));
    }
    ensure_billboard(&state, store.id, input.billboard_id).await?;

    Ok(Json(repo.update(store.id, id, &input).await?))
}

#[instrument(skip_all)]
async fn delete_category(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path((store_id, category_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let id: CategoryId = parse_id(&category_id, "category")?;
    CategoryRepository::new(state.pool())
        .delete(store.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
