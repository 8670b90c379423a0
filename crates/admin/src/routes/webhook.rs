//! Payment provider webhook endpoint.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use chrono::Utc;
use tracing::error;

use crate::error::AppError;
use crate::services::ReconcileOutcome;
use crate::state::AppState;

/// Header carrying the provider's signature.
const SIGNATURE_HEADER: &str = "stripe-signature";

/// Build the webhook router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/webhook", post(handle_webhook))
}

/// Verify and apply a payment event.
///
/// Only verification failures are reported back (400). Anything that goes
/// wrong after that is logged and acknowledged with 200 so the provider
/// does not redeliver.
async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    match state
        .reconciliation()
        .handle(&body, signature, Utc::now())
        .await
    {
        Ok(ReconcileOutcome::Confirmed { .. } | ReconcileOutcome::Ignored(_)) => Ok(StatusCode::OK),
        Err(e) if e.is_rejection() => Err(AppError::BadRequest(format!("Webhook Error: {e}"))),
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            error!(error = %e, sentry_event_id = %event_id, "Failed to apply payment webhook");
            Ok(StatusCode::OK)
        }
    }
}
