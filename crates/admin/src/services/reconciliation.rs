//! Payment reconciliation: apply verified provider webhooks to the ledger.
//!
//! Only `checkout.session.completed` events carrying an `orderId` in their
//! metadata change anything. The order is marked paid with the customer's
//! contact details and its products are archived, in one transaction.
//! Replaying the same event converges on the same state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, instrument};

use storedesk_core::OrderId;

use crate::db::RepositoryError;
use crate::ledger::{OrderLedger, PaymentConfirmation};
use crate::payments::{CHECKOUT_SESSION_COMPLETED, WebhookError, WebhookVerifier};

/// Width of the `orders.phone_no` column.
const MAX_PHONE_LENGTH: usize = 32;

/// What a delivery amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The order was marked paid and these many products archived.
    Confirmed { order_id: OrderId, archived: usize },
    /// Verified, but nothing to do.
    Ignored(&'static str),
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The delivery could not be authenticated; nothing was applied.
    #[error("{0}")]
    Verification(#[from] WebhookError),

    #[error("Invalid checkout session: {0}")]
    InvalidSession(WebhookError),

    #[error("Invalid order id in metadata: {0}")]
    InvalidOrderId(String),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Ledger error: {0}")]
    Ledger(#[from] RepositoryError),
}

impl ReconcileError {
    /// Whether the provider should be told the delivery was rejected.
    ///
    /// Everything past signature verification is acknowledged so the
    /// provider does not keep redelivering it.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Verification(_))
    }
}

/// Applies payment webhooks.
#[derive(Clone)]
pub struct ReconciliationService {
    ledger: Arc<dyn OrderLedger>,
    verifier: WebhookVerifier,
}

impl std::fmt::Debug for ReconciliationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationService")
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

impl ReconciliationService {
    #[must_use]
    pub fn new(ledger: Arc<dyn OrderLedger>, verifier: WebhookVerifier) -> Self {
        Self { ledger, verifier }
    }

    /// Verify and apply one webhook delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Verification`] when the signature or body is
    /// rejected, and other variants when a verified event could not be applied.
    #[instrument(skip(self, payload, signature))]
    pub async fn handle(
        &self,
        payload: &str,
        signature: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let event = self.verifier.verify(payload, signature, now)?;

        if event.event_type != CHECKOUT_SESSION_COMPLETED {
            debug!(event_id = %event.id, event_type = %event.event_type, "Ignoring webhook event");
            return Ok(ReconcileOutcome::Ignored("unhandled event type"));
        }

        let session = event
            .checkout_session()
            .map_err(ReconcileError::InvalidSession)?;
        let Some(raw_order_id) = session.order_id() else {
            debug!(session_id = %session.id, "Completed session without order id");
            return Ok(ReconcileOutcome::Ignored("no order id in metadata"));
        };
        let order_id: OrderId = raw_order_id
            .parse()
            .map_err(|_| ReconcileError::InvalidOrderId(raw_order_id.to_owned()))?;

        let details = session.customer_details.unwrap_or_default();
        let confirmation = PaymentConfirmation {
            address: details
                .address
                .map(|a| a.joined_for_storage())
                .unwrap_or_default(),
            phone: details
                .phone
                .map(|p| p.trim().chars().take(MAX_PHONE_LENGTH).collect())
                .unwrap_or_default(),
        };

        let archived = self
            .ledger
            .confirm_payment(order_id, &confirmation)
            .await?
            .ok_or(ReconcileError::OrderNotFound(order_id))?;

        info!(
            order_id = %order_id,
            session_id = %session.id,
            archived = archived.len(),
            "Order payment confirmed"
        );

        Ok(ReconcileOutcome::Confirmed {
            order_id,
            archived: archived.len(),
        })
    }
}
