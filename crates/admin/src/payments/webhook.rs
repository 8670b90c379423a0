//! Webhook signature verification and event payloads.
//!
//! Stripe signs each delivery with a `Stripe-Signature` header of the form
//! `t=<unix seconds>,v1=<hex hmac>[,v1=...]`. The signed message is
//! `"{t}.{raw body}"` under HMAC-SHA256 with the endpoint's signing secret.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, instrument};

use storedesk_core::PostalAddress;

use super::WebhookError;

/// Event type emitted when a hosted checkout is paid.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// A decoded webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The fields of a checkout session that reconciliation reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub customer_details: Option<CustomerDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    pub phone: Option<String>,
    pub address: Option<PostalAddress>,
}

impl WebhookEvent {
    /// Decode `data.object` as a checkout session.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::InvalidPayload`] if the object has the wrong shape.
    pub fn checkout_session(&self) -> Result<CheckoutSessionObject, WebhookError> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }
}

impl CheckoutSessionObject {
    /// The pending order this session pays for, as written at checkout.
    #[must_use]
    pub fn order_id(&self) -> Option<&str> {
        self.metadata.get("orderId").map(String::as_str)
    }
}

/// Verifies webhook deliveries against the endpoint signing secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
    tolerance: Duration,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"[REDACTED]")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl WebhookVerifier {
    #[must_use]
    pub const fn new(secret: SecretString, tolerance: Duration) -> Self {
        Self { secret, tolerance }
    }

    /// Check the signature header against the raw body and decode the event.
    ///
    /// # Errors
    ///
    /// Returns a [`WebhookError`] if the header is missing or malformed, the
    /// timestamp is outside the tolerance, no `v1` signature matches, or the
    /// body is not an event.
    #[instrument(skip(self, payload, header))]
    pub fn verify(
        &self,
        payload: &str,
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<WebhookEvent, WebhookError> {
        let header = header.ok_or(WebhookError::MissingHeader)?;
        let (timestamp, signatures) = parse_header(header)?;

        let age = now.timestamp().abs_diff(timestamp);
        if age > self.tolerance.as_secs() {
            return Err(WebhookError::TimestampOutOfTolerance);
        }

        let expected = self.sign(timestamp, payload)?;
        if !signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate))
        {
            return Err(WebhookError::SignatureMismatch);
        }

        debug!("Webhook signature verified");

        serde_json::from_str(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }

    /// Hex HMAC of `"{timestamp}.{payload}"`.
    fn sign(&self, timestamp: i64, payload: &str) -> Result<String, WebhookError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| WebhookError::SignatureMismatch)?;
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Split a signature header into its timestamp and `v1` signatures.
fn parse_header(header: &str) -> Result<(i64, Vec<&str>), WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for pair in header.split(',') {
        let Some((key, value)) = pair.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    match timestamp {
        Some(t) if !signatures.is_empty() => Ok((t, signatures)),
        _ => Err(WebhookError::MalformedHeader),
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_9f8e7d6c5b4a";
    const PAYLOAD: &str = r#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"cs_1","metadata":{"orderId":"abc"},"customer_details":{"phone":"+15550100","address":{"line1":"1 Main St","city":"Springfield","country":"US"}}}}}"#;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(SecretString::from(SECRET.to_string()), Duration::from_secs(300))
    }

    fn signature(timestamp: i64, payload: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "hell"));
        assert!(!constant_time_compare("hello", "world"));
    }

    #[test]
    fn test_verify_valid_signature_decodes_event() {
        let now = Utc::now();
        let t = now.timestamp();
        let header = format!("t={t},v1={}", signature(t, PAYLOAD));

        let event = verifier().verify(PAYLOAD, Some(&header), now).unwrap();
        assert_eq!(event.event_type, CHECKOUT_SESSION_COMPLETED);

        let session = event.checkout_session().unwrap();
        assert_eq!(session.order_id(), Some("abc"));
        let details = session.customer_details.unwrap();
        assert_eq!(details.phone.as_deref(), Some("+15550100"));
        assert_eq!(
            details.address.unwrap().joined(),
            "1 Main St, Springfield, US"
        );
    }

    #[test]
    fn test_verify_accepts_any_matching_v1() {
        let now = Utc::now();
        let t = now.timestamp();
        let header = format!("t={t},v1=deadbeef,v0=ignored,v1={}", signature(t, PAYLOAD));
        assert!(verifier().verify(PAYLOAD, Some(&header), now).is_ok());
    }

    #[test]
    fn test_verify_rejects_tampered_body() {
        let now = Utc::now();
        let t = now.timestamp();
        let header = format!("t={t},v1={}", signature(t, PAYLOAD));
        let tampered = PAYLOAD.replace("abc", "xyz");

        let err = verifier().verify(&tampered, Some(&header), now).unwrap_err();
        assert_eq!(err, WebhookError::SignatureMismatch);
    }

    #[test]
    fn test_verify_rejects_old_timestamp() {
        let now = Utc::now();
        let t = now.timestamp() - 301;
        let header = format!("t={t},v1={}", signature(t, PAYLOAD));

        let err = verifier().verify(PAYLOAD, Some(&header), now).unwrap_err();
        assert_eq!(err, WebhookError::TimestampOutOfTolerance);
    }

    #[test]
    fn test_verify_missing_and_malformed_header() {
        let now = Utc::now();
        assert_eq!(
            verifier().verify(PAYLOAD, None, now).unwrap_err(),
            WebhookError::MissingHeader
        );
        assert_eq!(
            verifier().verify(PAYLOAD, Some("garbage"), now).unwrap_err(),
            WebhookError::MalformedHeader
        );
        assert_eq!(
            verifier().verify(PAYLOAD, Some("t=abc,v1=00"), now).unwrap_err(),
            WebhookError::MalformedHeader
        );
    }

    #[test]
    fn test_verify_signed_non_event_body() {
        let now = Utc::now();
        let t = now.timestamp();
        let body = "not json";
        let header = format!("t={t},v1={}", signature(t, body));

        let err = verifier().verify(body, Some(&header), now).unwrap_err();
        assert!(matches!(err, WebhookError::InvalidPayload(_)));
    }

    #[test]
    fn test_session_without_customer_details() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"id":"evt_2","type":"checkout.session.completed","data":{"object":{"id":"cs_2"}}}"#,
        )
        .unwrap();
        let session = event.checkout_session().unwrap();
        assert!(session.order_id().is_none());
        assert!(session.customer_details.is_none());
    }
}
