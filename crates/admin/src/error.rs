//! Unified error handling for the dashboard API.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use storedesk_core::ValidationErrors;

use crate::db::RepositoryError;
use crate::payments::PaymentError;
use crate::services::CheckoutError;

/// Application-level error type for the dashboard API.
///
/// Client errors render their message as a plain-text body; validation
/// failures render JSON with per-field messages.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Payment provider call failed.
    #[error("Payment provider error: {0}")]
    Payment(#[from] PaymentError),

    /// Request body failed field checks.
    #[error("{message}")]
    Validation {
        message: String,
        errors: ValidationErrors,
    },

    /// Well-formed request the current state cannot accept.
    #[error("{0}")]
    Unprocessable(String),

    /// Conflicts with existing data.
    #[error("{0}")]
    Conflict(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Caller is not authenticated or does not own the store.
    #[error("{0}")]
    Unauthorized(String),

    /// Body was not acceptable JSON.
    #[error(transparent)]
    Body(#[from] JsonRejection),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A 422 carrying field-level messages.
    #[must_use]
    pub fn validation(message: impl Into<String>, errors: ValidationErrors) -> Self {
        Self::Validation {
            message: message.into(),
            errors,
        }
    }

    /// The `401 Unauthorized` returned for missing identity and foreign stores.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Unauthorized".to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Validation { .. } | Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Body(rejection) => rejection.status(),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(message) => Self::Conflict(message),
            RepositoryError::NotFound => Self::NotFound("Not found".to_string()),
            other => Self::Database(other),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::InvalidStoreId => Self::BadRequest(err.to_string()),
            CheckoutError::Validation(errors) => Self::validation("Invalid product Ids", errors),
            CheckoutError::StoreNotFound => Self::NotFound(err.to_string()),
            CheckoutError::ProductsUnavailable(_) => Self::Conflict(err.to_string()),
            CheckoutError::LikelyDuplicate(_) => Self::Unprocessable(err.to_string()),
            CheckoutError::InvalidAmount(_) => Self::Internal(err.to_string()),
            CheckoutError::Ledger(e) => e.into(),
            CheckoutError::Payment(e) => Self::Payment(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        match self {
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Internal(_) => {
                (status, "Internal server error").into_response()
            }
            Self::Payment(_) => (status, "External service error").into_response(),
            Self::Body(rejection) => (status, rejection.body_text()).into_response(),
            Self::Validation { message, errors } => (
                status,
                Json(json!({ "message": message, "errors": errors })),
            )
                .into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}

/// Set the Sentry user context from the identity provider's user id.
pub fn set_sentry_user(user_id: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_text(err: AppError) -> String {
        let bytes = to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Store not exist".to_string());
        assert_eq!(err.to_string(), "Store not exist");

        let err = AppError::Internal("pool timed out".to_string());
        assert_eq!(err.to_string(), "Internal error: pool timed out");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(get_status(AppError::unauthorized()), StatusCode::UNAUTHORIZED);
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Unprocessable("test".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Payment(PaymentError::Request("down".to_string()))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_repository_conflict_maps_to_409() {
        let err: AppError = RepositoryError::Conflict("Size already exist".to_string()).into();
        assert_eq!(get_status(err), StatusCode::CONFLICT);
    }

    #[test]
    fn test_checkout_errors_map_to_statuses() {
        assert_eq!(
            get_status(CheckoutError::InvalidStoreId.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CheckoutError::StoreNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CheckoutError::ProductsUnavailable(vec!["x".to_string()]).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CheckoutError::LikelyDuplicate(storedesk_core::OrderId::generate()).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(
                CheckoutError::Validation(ValidationErrors::single("productIds", "is required"))
                    .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let body = body_text(AppError::Internal("password=hunter2".to_string())).await;
        assert_eq!(body, "Internal server error");
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let body = body_text(AppError::validation(
            "Invalid product Ids",
            ValidationErrors::single("productIds", "is required"),
        ))
        .await;
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["message"], "Invalid product Ids");
        assert_eq!(value["errors"][0]["field"], "productIds");
    }

    #[tokio::test]
    async fn test_client_error_body_is_message() {
        let body = body_text(AppError::Conflict("Store already exist".to_string())).await;
        assert_eq!(body, "Store already exist");
    }
}
