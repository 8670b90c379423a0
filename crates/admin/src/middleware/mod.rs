//! HTTP middleware stack for the dashboard API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, outermost)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (propagate or generate `x-request-id`)
//! 4. CORS (checkout routes only)
//!
//! Identity comes from the fronting identity provider through the
//! [`RequireUser`] extractor rather than a layer.

pub mod auth;
pub mod cors;
pub mod request_id;

pub use auth::{RequireUser, UserRejection};
pub use cors::checkout_cors;
pub use request_id::{REQUEST_ID_HEADER, request_id};
