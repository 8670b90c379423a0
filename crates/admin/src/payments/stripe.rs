//! Stripe REST client for hosted checkout sessions.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, error, instrument};
use url::Url;

use super::{CheckoutGateway, CheckoutSession, CheckoutSessionRequest, PaymentError};

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    api_key: SecretString,
    api_base: Url,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base.as_str())
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Create a new Stripe client against `api_base` (normally `https://api.stripe.com`).
    #[must_use]
    pub fn new(api_key: SecretString, api_base: Url) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_base.as_str().trim_end_matches('/'))
    }
}

/// Encode a session request the way Stripe's form API nests parameters.
fn session_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut form = Vec::with_capacity(request.line_items.len() * 4 + 7);

    for (i, item) in request.line_items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
        form.push((
            format!("{prefix}[price_data][currency]"),
            item.currency.as_lower_str().to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            item.name.clone(),
        ));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
    }

    form.extend([
        ("mode".to_string(), "payment".to_string()),
        ("billing_address_collection".to_string(), "required".to_string()),
        ("phone_number_collection[enabled]".to_string(), "true".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("metadata[orderId]".to_string(), request.order_id.to_string()),
    ]);

    form
}

#[async_trait]
impl CheckoutGateway for StripeClient {
    #[instrument(skip(self, request), fields(order_id = %request.order_id, items = request.line_items.len()))]
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .client
            .post(self.endpoint("/v1/checkout/sessions"))
            .bearer_auth(self.api_key.expose_secret())
            .form(&session_form(request))
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            error!(status = status.as_u16(), %message, "Stripe API error creating session");
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Response(e.to_string()))?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::Response("session has no url".to_string()))?;

        debug!(session_id = %session.id, "Checkout session created");

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storedesk_core::{CurrencyCode, OrderId};

    use super::*;
    use crate::payments::LineItem;

    fn value<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_session_form_encodes_line_items_and_metadata() {
        let order_id = OrderId::generate();
        let request = CheckoutSessionRequest {
            line_items: vec![
                LineItem {
                    name: "Hat".to_string(),
                    unit_amount: 1999,
                    quantity: 1,
                    currency: CurrencyCode::Usd,
                },
                LineItem {
                    name: "Scarf".to_string(),
                    unit_amount: 500,
                    quantity: 1,
                    currency: CurrencyCode::Usd,
                },
            ],
            success_url: "https://shop.test/carts?success=1".to_string(),
            cancel_url: "https://shop.test/carts?cancelled=1".to_string(),
            order_id,
        };

        let form = session_form(&request);

        assert_eq!(value(&form, "line_items[0][quantity]"), Some("1"));
        assert_eq!(value(&form, "line_items[0][price_data][currency]"), Some("usd"));
        assert_eq!(
            value(&form, "line_items[0][price_data][product_data][name]"),
            Some("Hat")
        );
        assert_eq!(value(&form, "line_items[0][price_data][unit_amount]"), Some("1999"));
        assert_eq!(value(&form, "line_items[1][price_data][unit_amount]"), Some("500"));
        assert_eq!(value(&form, "mode"), Some("payment"));
        assert_eq!(value(&form, "billing_address_collection"), Some("required"));
        assert_eq!(value(&form, "phone_number_collection[enabled]"), Some("true"));
        assert_eq!(
            value(&form, "metadata[orderId]"),
            Some(order_id.to_string().as_str())
        );
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = StripeClient::new(
            SecretString::from("sk_test_abc".to_string()),
            Url::parse("https://api.stripe.com/").unwrap(),
        );
        assert_eq!(
            client.endpoint("/v1/checkout/sessions"),
            "https://api.stripe.com/v1/checkout/sessions"
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = StripeClient::new(
            SecretString::from("sk_test_abc".to_string()),
            Url::parse("https://api.stripe.com").unwrap(),
        );
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk_test_abc"));
        assert!(debug.contains("[REDACTED]"));
    }
}
