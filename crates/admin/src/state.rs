//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::ledger::{OrderLedger, PgLedger};
use crate::payments::{CheckoutGateway, StripeClient, WebhookVerifier};
use crate::services::{CheckoutService, ReconciliationService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    checkout: CheckoutService,
    reconciliation: ReconciliationService,
}

impl AppState {
    /// Production state: Postgres ledger and the Stripe gateway.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let ledger = Arc::new(PgLedger::new(pool.clone()));
        let gateway = Arc::new(StripeClient::new(
            config.stripe.api_key.clone(),
            config.stripe.api_base.clone(),
        ));
        Self::from_parts(config, pool, ledger, gateway)
    }

    /// State over an arbitrary ledger and gateway.
    #[must_use]
    pub fn from_parts(
        config: AdminConfig,
        pool: PgPool,
        ledger: Arc<dyn OrderLedger>,
        gateway: Arc<dyn CheckoutGateway>,
    ) -> Self {
        let checkout = CheckoutService::new(
            Arc::clone(&ledger),
            gateway,
            config.checkout.clone(),
            config.stripe.currency,
        );
        let verifier = WebhookVerifier::new(
            config.stripe.webhook_secret.clone(),
            config.stripe.webhook_tolerance,
        );
        let reconciliation = ReconciliationService::new(ledger, verifier);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                checkout,
                reconciliation,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    #[must_use]
    pub fn reconciliation(&self) -> &ReconciliationService {
        &self.inner.reconciliation
    }
}
