//! Business logic services for the dashboard.
//!
//! # Services
//!
//! - `checkout` - Cart to pending order to hosted payment session
//! - `reconciliation` - Payment webhooks applied to the order ledger

pub mod checkout;
pub mod reconciliation;

pub use checkout::{
    CallbackUrls, CheckoutCommand, CheckoutError, CheckoutOutcome, CheckoutRequest,
    CheckoutService, find_likely_duplicate,
};
pub use reconciliation::{ReconcileError, ReconcileOutcome, ReconciliationService};
