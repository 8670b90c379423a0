//! Checkout: turn a cart of product ids into a pending order and a hosted
//! payment session.
//!
//! # Flow
//!
//! 1. Parse the store id and validate the request body
//! 2. Resolve the store and the cart's products
//! 3. Refuse carts that look like a resubmission of a recent order
//! 4. Record the pending order and its items (one transaction)
//! 5. Open a payment session carrying the order id as metadata

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

use storedesk_core::{
    CurrencyCode, OrderId, PriceError, ProductId, StoreId, Validated, ValidationErrors,
};

use crate::config::CheckoutConfig;
use crate::db::RepositoryError;
use crate::ledger::{CheckoutProduct, OrderLedger, OrderSnapshot};
use crate::payments::{CheckoutGateway, CheckoutSessionRequest, LineItem, PaymentError};

/// Raw checkout body as sent by storefront clients.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub product_ids: Option<Vec<String>>,
    pub callback_urls: Option<CallbackUrls>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackUrls {
    pub confirmation_url: Option<String>,
    pub cancellation_url: Option<String>,
}

/// A validated checkout request.
///
/// Product ids stay as submitted: ids that are not UUIDs cannot exist in the
/// catalog and are reported back as unavailable, not as malformed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCommand {
    pub product_ids: Vec<String>,
    pub success_url: Option<Url>,
    pub cancel_url: Option<Url>,
}

impl CheckoutRequest {
    /// Check the body shape.
    ///
    /// # Errors
    ///
    /// Fails when `productIds` is missing, empty, holds blank or repeated
    /// entries, or when `callbackUrls` is present without two valid URLs.
    pub fn validate(self) -> Validated<CheckoutCommand> {
        let mut errors = ValidationErrors::new();

        let product_ids: Vec<String> = self
            .product_ids
            .unwrap_or_default()
            .into_iter()
            .map(|id| id.trim().to_owned())
            .collect();

        if product_ids.is_empty() {
            errors.add("productIds", "is required");
        } else if product_ids.iter().any(String::is_empty) {
            errors.add("productIds", "must not contain blank ids");
        } else {
            // Every spelling of one UUID (simple, braced, urn) is the same product
            let mut seen = HashSet::new();
            if !product_ids.iter().all(|id| seen.insert(dedup_key(id))) {
                errors.add("productIds", "must not contain duplicates");
            }
        }

        let (success_url, cancel_url) = match self.callback_urls {
            Some(urls) => (
                errors.url(
                    "callbackUrls.confirmationUrl",
                    urls.confirmation_url.as_deref(),
                ),
                errors.url(
                    "callbackUrls.cancellationUrl",
                    urls.cancellation_url.as_deref(),
                ),
            ),
            None => (None, None),
        };

        errors.finish(|| CheckoutCommand {
            product_ids,
            success_url,
            cancel_url,
        })
    }
}

fn dedup_key(raw: &str) -> String {
    raw.parse::<ProductId>()
        .map_or_else(|_| raw.to_lowercase(), |id| id.to_string())
}

/// Successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutOutcome {
    #[serde(skip)]
    pub order_id: OrderId,
    /// Hosted payment page to redirect the customer to.
    pub url: String,
}

/// Why a checkout was refused.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Invalid store Id type")]
    InvalidStoreId,

    #[error("Invalid product Ids")]
    Validation(ValidationErrors),

    #[error("Store not exist")]
    StoreNotFound,

    #[error("{}", unavailable_message(.0))]
    ProductsUnavailable(Vec<String>),

    #[error("Possible duplicate order")]
    LikelyDuplicate(OrderId),

    #[error("Product price cannot be charged: {0}")]
    InvalidAmount(#[from] PriceError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] RepositoryError),

    #[error("Payment provider error: {0}")]
    Payment(#[from] PaymentError),
}

/// `This a of the cart products is not available` or the plural form.
fn unavailable_message(ids: &[String]) -> String {
    let (determiner, verb) = if ids.len() == 1 {
        ("This", "is")
    } else {
        ("These", "are")
    };
    format!(
        "{determiner} {} of the cart products {verb} not available",
        ids.join(", ")
    )
}

/// Find a prior order that makes this checkout look like a resubmission.
///
/// An order counts when all of its (request-restricted) items are in the
/// cart and it has no creation time, or when it is younger than `window`.
/// Orders dated in the future count as young.
#[must_use]
pub fn find_likely_duplicate(
    orders: &[OrderSnapshot],
    requested: &[ProductId],
    now: DateTime<Utc>,
    window: Duration,
) -> Option<OrderId> {
    orders
        .iter()
        .find(|order| {
            let mid_creation = order.created_at.is_none()
                && order.product_ids.iter().all(|id| requested.contains(id));
            let recent = order.created_at.is_some_and(|at| {
                now.signed_duration_since(at)
                    .to_std()
                    .map_or(true, |age| age < window)
            });
            mid_creation || recent
        })
        .map(|order| order.id)
}

/// Earliest creation time still inside the duplicate window.
fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(window)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Creates pending orders and their payment sessions.
#[derive(Clone)]
pub struct CheckoutService {
    ledger: Arc<dyn OrderLedger>,
    gateway: Arc<dyn CheckoutGateway>,
    config: CheckoutConfig,
    currency: CurrencyCode,
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService")
            .field("config", &self.config)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl CheckoutService {
    #[must_use]
    pub fn new(
        ledger: Arc<dyn OrderLedger>,
        gateway: Arc<dyn CheckoutGateway>,
        config: CheckoutConfig,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            ledger,
            gateway,
            config,
            currency,
        }
    }

    /// Run a checkout for `store_id` (as it appeared in the path).
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`]. Nothing is persisted unless the cart passed
    /// every check; a payment-provider failure leaves a pending order behind.
    #[instrument(skip(self, request), fields(store_id = %store_id))]
    pub async fn checkout(
        &self,
        store_id: &str,
        request: CheckoutRequest,
        now: DateTime<Utc>,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let store_id: StoreId = store_id.parse().map_err(|_| CheckoutError::InvalidStoreId)?;
        let command = request.validate().map_err(CheckoutError::Validation)?;

        if self.ledger.find_store(store_id).await?.is_none() {
            return Err(CheckoutError::StoreNotFound);
        }

        let products = self.resolve_products(store_id, &command.product_ids).await?;
        let product_ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();

        let recent = self
            .ledger
            .recent_orders(
                store_id,
                &product_ids,
                window_start(now, self.config.duplicate_window),
            )
            .await?;
        if let Some(existing) =
            find_likely_duplicate(&recent, &product_ids, now, self.config.duplicate_window)
        {
            warn!(order_id = %existing, "Rejecting likely duplicate checkout");
            return Err(CheckoutError::LikelyDuplicate(existing));
        }

        let line_items = products
            .iter()
            .map(|p| {
                Ok(LineItem {
                    name: p.name.clone(),
                    unit_amount: p.price.to_minor_units()?,
                    quantity: 1,
                    currency: self.currency,
                })
            })
            .collect::<Result<Vec<_>, PriceError>>()?;

        let order = self
            .ledger
            .create_pending_order(store_id, &product_ids)
            .await?;

        let session = self
            .gateway
            .create_session(&CheckoutSessionRequest {
                line_items,
                success_url: command
                    .success_url
                    .map_or_else(|| self.config.default_success_url(), String::from),
                cancel_url: command
                    .cancel_url
                    .map_or_else(|| self.config.default_cancel_url(), String::from),
                order_id: order.id,
            })
            .await?;

        info!(
            order_id = %order.id,
            session_id = %session.id,
            items = product_ids.len(),
            "Checkout session created"
        );

        Ok(CheckoutOutcome {
            order_id: order.id,
            url: session.url,
        })
    }

    /// Resolve every requested id to a sellable product, in request order.
    async fn resolve_products(
        &self,
        store_id: StoreId,
        requested: &[String],
    ) -> Result<Vec<CheckoutProduct>, CheckoutError> {
        let parsed: Vec<ProductId> = requested.iter().filter_map(|s| s.parse().ok()).collect();
        let found = self.ledger.find_products(store_id, &parsed).await?;

        let mut resolved = Vec::with_capacity(requested.len());
        let mut missing = Vec::new();
        for raw in requested {
            let product = raw
                .parse::<ProductId>()
                .ok()
                .and_then(|id| found.iter().find(|p| p.id == id));
            match product {
                Some(product) => resolved.push(product.clone()),
                None => missing.push(raw.clone()),
            }
        }

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(CheckoutError::ProductsUnavailable(missing))
        }
    }
}
