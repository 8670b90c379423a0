//! Order domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use storedesk_core::{OrderId, OrderItemId, PaymentStatus, ProductId, StoreId};

/// An order. Created pending at checkout, marked paid by the payment webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub store_id: StoreId,
    pub made_payment: bool,
    pub phone_no: String,
    pub address: String,
    /// Nullable in storage; an order without one counts as mid-creation.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    #[must_use]
    pub const fn status(&self) -> PaymentStatus {
        PaymentStatus::from_made_payment(self.made_payment)
    }
}

/// One product in an order. Quantity is always one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
}

/// Order row for the dashboard's order table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub phone: String,
    pub address: String,
    /// Product names joined with `", "`.
    pub products: String,
    /// Sum of item prices, formatted as `$12.00`.
    pub total_price: String,
    pub is_paid: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Format an amount the way the dashboard displays money.
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    if rounded.is_sign_negative() {
        format!("-${:.2}", rounded.abs())
    } else {
        format!("${rounded:.2}")
    }
}
