//! Identity extractor for owner-gated routes.
//!
//! Authentication happens upstream: the identity provider in front of the
//! service forwards the signed-in user's id in a configured header
//! (`x-user-id` by default). Handlers that write store data take a
//! [`RequireUser`] and compare it with the store's owner.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Extractor that requires an authenticated user id.
///
/// # Example
///
/// ```rust,ignore
/// async fn create_store(
///     State(state): State<AppState>,
///     RequireUser(user_id): RequireUser,
/// ) -> Result<impl IntoResponse, AppError> {
///     // ...
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireUser(pub String);

/// Returned when no usable identity header is present.
#[derive(Debug)]
pub struct UserRejection;

impl IntoResponse for UserRejection {
    fn into_response(self) -> Response {
        AppError::unauthorized().into_response()
    }
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = UserRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(state.config().identity_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(UserRejection)?;

        set_sentry_user(user_id);

        Ok(Self(user_id.to_owned()))
    }
}
