//! Colour routes. Values are CSS hex colours.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use storedesk_core::{ColourId, Validated, ValidationErrors};

use crate::db::{ColourInput, ColourRepository};
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::Colour;
use crate::state::AppState;

use super::{find_store, owned_store, parse_id};

const MAX_NAME_CHARS: usize = 54;

/// Build the colours router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/{store_id}/colours",
            get(list_colours).post(create_colour),
        )
        .route(
            "/api/{store_id}/colours/{colour_id}",
            get(get_colour).patch(update_colour).delete(delete_colour),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct ColourRequest {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl ColourRequest {
    /// # Errors
    ///
    /// Fails on a blank or overlong name, or a value that is not `#rgb`/`#rrggbb`.
    pub fn validate(self) -> Validated<ColourInput> {
        let mut errors = ValidationErrors::new();
        let name = errors.required_text("name", self.name.as_deref(), MAX_NAME_CHARS);
        let value = errors.hex_colour("value", self.value.as_deref());
        errors.finish(|| ColourInput {
            name: name.unwrap_or_default(),
            value: value.unwrap_or_default(),
        })
    }
}

async fn list_colours(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
) -> Result<Json<Vec<Colour>>, AppError> {
    let store = find_store(&state, &store_id).await?;
    let colours = ColourRepository::new(state.pool()).list(store.id).await?;
    Ok(Json(colours))
}

async fn get_colour(
    State(state): State<AppState>,
    Path((store_id, colour_id)): Path<(String, String)>,
) -> Result<Json<Colour>, AppError> {
    let store = find_store(&state, &store_id).await?;
    let id: ColourId = parse_id(&colour_id, "colour")?;
    ColourRepository::new(state.pool())
        .get(store.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Colour not exist".to_string()))
}

#[instrument(skip_all)]
async fn create_colour(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(store_id): Path<String>,
    Json(request): Json<ColourRequest>,
) -> Result<Json<Colour>, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let input = request
        .validate()
        .map_err(|e| AppError::validation("Invalid colour", e))?;

    let colour = ColourRepository::new(state.pool())
        .create(store.id, &input)
        .await?;
    Ok(Json(colour))
}

#[instrument(skip_all)]
async fn update_colour(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path((store_id, colour_id)): Path<(String, String)>,
    Json(request): Json<ColourRequest>,
) -> Result<Json<Colour>, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let id: ColourId = parse_id(&colour_id, "colour")?;
    let input = request
        .validate()
        .map_err(|e| AppError::validation("Invalid colour", e))?;

    let repo = ColourRepository::new(state.pool());
    let existing = repo
        .get(store.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Colour not exist".to_string()))?;
    if input.matches(&existing) {
        return Err(AppError::Conflict("Colour already updated".to_string()));
    }

    Ok(Json(repo.update(store.id, id, &input).await?))
}

#[instrument(skip_all)]
async fn delete_colour(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path((store_id, colour_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let id: ColourId = parse_id(&colour_id, "colour")?;
    ColourRepository::new(state.pool())
        .delete(store.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_colour_request_requires_hex_value() {
        assert!(
            ColourRequest {
                name: Some("Teal".to_string()),
                value: Some("#008080".to_string()),
            }
            .validate()
            .is_ok()
        );

        let err = ColourRequest {
            name: Some("Teal".to_string()),
            value: Some("teal".to_string()),
        }
        .validate()
        .unwrap_err();
        assert!(err.has_field("value"));
    }
}
