//! Core types for Storedesk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod id;
pub mod price;
pub mod status;

pub use address::PostalAddress;
pub use id::*;
pub use price::{CurrencyCode, Price, PriceError};
pub use status::*;
