//! Domain models for the dashboard API.
//!
//! Catalog entities belong to a store; orders and their items are owned by
//! the order ledger (see [`crate::ledger`]).

pub mod catalog;
pub mod order;

pub use catalog::{Billboard, Category, Colour, Image, Product, ProductView, Size, Store};
pub use order::{Order, OrderItem, OrderSummary};
