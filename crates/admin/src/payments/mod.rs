//! Payment provider integration (Stripe).
//!
//! This module provides:
//! - [`CheckoutGateway`], the seam checkout uses to open a hosted payment page
//! - [`StripeClient`], the production gateway
//! - [`WebhookVerifier`] and the event types delivered to `/api/webhook`
//!
//! # Flow
//!
//! 1. Checkout records a pending order and asks the gateway for a session
//! 2. The customer pays on the provider's page
//! 3. The provider calls the webhook with a signed `checkout.session.completed`
//! 4. Reconciliation marks the order paid and archives its products

mod error;
mod stripe;
mod webhook;

use async_trait::async_trait;
use serde::Serialize;

use storedesk_core::{CurrencyCode, OrderId};

pub use error::{PaymentError, WebhookError};
pub use stripe::StripeClient;
pub use webhook::{
    CHECKOUT_SESSION_COMPLETED, CheckoutSessionObject, CustomerDetails, EventData, WebhookEvent,
    WebhookVerifier,
};

/// One purchasable line of a checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub name: String,
    /// Unit price in minor units (cents).
    pub unit_amount: i64,
    pub quantity: u32,
    pub currency: CurrencyCode,
}

/// Everything needed to open a hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub line_items: Vec<LineItem>,
    pub success_url: String,
    pub cancel_url: String,
    /// Echoed back in the completion webhook as `metadata.orderId`.
    pub order_id: OrderId,
}

/// A session created by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    /// Where to send the customer to pay.
    pub url: String,
}

/// Creates hosted checkout sessions.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Open a payment session for a pending order.
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError>;
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::RecordingGateway;

#[cfg(any(test, feature = "test-support"))]
mod recording {
    use tokio::sync::Mutex;

    use super::{CheckoutGateway, CheckoutSession, CheckoutSessionRequest, PaymentError};

    /// Gateway that remembers every request and hands back a fake session.
    #[derive(Debug, Default)]
    pub struct RecordingGateway {
        requests: Mutex<Vec<CheckoutSessionRequest>>,
        fail: bool,
    }

    impl RecordingGateway {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// A gateway whose every call fails as if the provider were down.
        #[must_use]
        pub fn failing() -> Self {
            Self {
                requests: Mutex::default(),
                fail: true,
            }
        }

        pub async fn requests(&self) -> Vec<CheckoutSessionRequest> {
            self.requests.lock().await.clone()
        }
    }

    #[async_trait::async_trait]
    impl CheckoutGateway for RecordingGateway {
        async fn create_session(
            &self,
            request: &CheckoutSessionRequest,
        ) -> Result<CheckoutSession, PaymentError> {
            let mut requests = self.requests.lock().await;
            requests.push(request.clone());
            if self.fail {
                return Err(PaymentError::Request("connection refused".to_string()));
            }
            Ok(CheckoutSession {
                id: format!("cs_test_{}", requests.len()),
                url: format!("https://checkout.stripe.test/pay/{}", request.order_id),
            })
        }
    }
}
