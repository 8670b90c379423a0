//! Integration tests for Storedesk.
//!
//! # Running Tests
//!
//! ```bash
//! # Router tests (no database needed)
//! cargo test -p storedesk-integration-tests
//!
//! # Including the Postgres-backed tests
//! STOREDESK_TEST_DATABASE_URL=postgres://... cargo test -p storedesk-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - Checkout through payment confirmation over the router
//! - `access` - Identity, CORS and request-id behaviour
//! - `postgres_ledger` - Ledger and repositories against a real database
//!
//! Router tests run the full [`storedesk_admin::app`] over an in-memory
//! ledger and a recording payment gateway. The database pool is lazy and
//! never connects, so only routes that avoid `PostgreSQL` are exercised.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::SecretString;
use sha2::Sha256;
use tower::ServiceExt;
use url::Url;

use storedesk_admin::config::{AdminConfig, CheckoutConfig, StripeConfig};
use storedesk_admin::ledger::MemoryLedger;
use storedesk_admin::payments::RecordingGateway;
use storedesk_admin::state::AppState;
use storedesk_core::CurrencyCode;

/// Signing secret shared by [`TestApp`] and [`sign`].
pub const WEBHOOK_SECRET: &str = "whsec_integration_Zq81xVb2Lm";

/// Header the test identity proxy would set.
pub const USER_HEADER: &str = "x-user-id";

/// Configuration pointing at nothing real.
///
/// # Panics
///
/// Panics if the hard-coded URLs fail to parse.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_config() -> AdminConfig {
    AdminConfig {
        database_url: SecretString::from("postgres://storedesk@127.0.0.1:1/unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        log_json: false,
        stripe: StripeConfig {
            api_key: SecretString::from("sk_test_integration_9fJ2kLx"),
            webhook_secret: SecretString::from(WEBHOOK_SECRET),
            api_base: Url::parse("http://127.0.0.1:1").unwrap(),
            currency: CurrencyCode::Usd,
            webhook_tolerance: Duration::from_secs(300),
        },
        checkout: CheckoutConfig {
            frontend_store_url: Url::parse("https://shop.test").unwrap(),
            duplicate_window: Duration::from_secs(120),
        },
        identity_header: USER_HEADER.to_string(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The application router wired to inspectable fakes.
pub struct TestApp {
    pub router: Router,
    pub ledger: Arc<MemoryLedger>,
    pub gateway: Arc<RecordingGateway>,
}

impl TestApp {
    /// # Panics
    ///
    /// Panics if the lazy pool cannot be built from the test URL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_gateway(RecordingGateway::new())
    }

    /// # Panics
    ///
    /// Panics if the lazy pool cannot be built from the test URL.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_gateway(gateway: RecordingGateway) -> Self {
        let config = test_config();
        let pool = storedesk_admin::db::create_lazy_pool(&config.database_url)
            .expect("lazy pool from test URL");
        let ledger = Arc::new(MemoryLedger::new());
        let gateway = Arc::new(gateway);
        let state = AppState::from_parts(config, pool, ledger.clone(), gateway.clone());

        Self {
            router: storedesk_admin::app(state),
            ledger,
            gateway,
        }
    }

    /// Send one request through a fresh clone of the router.
    ///
    /// # Panics
    ///
    /// Panics if the router itself errors (it is infallible).
    #[allow(clippy::expect_used)]
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A JSON `POST`.
///
/// # Panics
///
/// Panics on an invalid URI.
#[must_use]
#[allow(clippy::expect_used)]
pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// Read a response body as text.
///
/// # Panics
///
/// Panics if the body cannot be read or is not UTF-8.
#[allow(clippy::expect_used)]
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// A `Stripe-Signature` header value for `payload` signed at `at`.
///
/// # Panics
///
/// Panics never in practice; HMAC accepts keys of any length.
#[must_use]
#[allow(clippy::expect_used)]
pub fn sign(payload: &str, secret: &str, at: DateTime<Utc>) -> String {
    let timestamp = at.timestamp();
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

/// A `checkout.session.completed` event for `order_id`.
#[must_use]
pub fn completed_event(order_id: &str, phone: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "id": "evt_test_1",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_test_1",
                "metadata": { "orderId": order_id },
                "customer_details": {
                    "phone": phone,
                    "address": {
                        "line1": "12 Harbour Rd",
                        "line2": null,
                        "city": "Portsmouth",
                        "state": null,
                        "postal_code": "PO1 2AB",
                        "country": "GB"
                    }
                }
            }
        }
    })
}

/// A webhook `POST` carrying `event`, signed now with the test secret.
///
/// # Panics
///
/// Panics on an invalid request.
#[must_use]
#[allow(clippy::expect_used)]
pub fn signed_webhook(event: &serde_json::Value) -> Request<Body> {
    let payload = event.to_string();
    Request::post("/api/webhook")
        .header("stripe-signature", sign(&payload, WEBHOOK_SECRET, Utc::now()))
        .body(Body::from(payload))
        .expect("valid request")
}
