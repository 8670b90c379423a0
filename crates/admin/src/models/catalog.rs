//! Catalog domain models: stores and the entities a store sells.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storedesk_core::{
    BillboardId, CategoryId, ColourId, ImageId, Price, ProductId, SizeId, StoreId,
};

/// A store, owned by a single identity-provider user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    /// Identity-provider user id of the owner.
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    /// Whether `user_id` owns this store.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// A promotional banner shown above a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Billboard {
    pub id: BillboardId,
    pub store_id: StoreId,
    pub label: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub store_id: StoreId,
    pub billboard_id: BillboardId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Size {
    pub id: SizeId,
    pub store_id: StoreId,
    pub name: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named colour; `value` is a CSS hex colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Colour {
    pub id: ColourId,
    pub store_id: StoreId,
    pub name: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product row as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub store_id: StoreId,
    pub category_id: CategoryId,
    pub size_id: SizeId,
    pub colour_id: ColourId,
    pub name: String,
    pub price: Price,
    pub is_featured: bool,
    /// Set once the product has been sold or withdrawn from sale.
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: ImageId,
    pub product_id: ProductId,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product joined with the display names of its category, size and colour
/// plus its images, as served to dashboard and storefront clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub category: String,
    pub size: String,
    pub colour: String,
    pub colour_name: String,
    pub images: Vec<Image>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_store_ownership() {
        let now = Utc::now();
        let store = Store {
            id: StoreId::generate(),
            name: "Corner Shop".to_string(),
            user_id: "user_123".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert!(store.is_owned_by("user_123"));
        assert!(!store.is_owned_by("user_456"));
    }

    #[test]
    fn test_product_view_serializes_flat_camel_case() {
        let now = Utc::now();
        let product = Product {
            id: ProductId::generate(),
            store_id: StoreId::generate(),
            category_id: CategoryId::generate(),
            size_id: SizeId::generate(),
            colour_id: ColourId::generate(),
            name: "Linen shirt".to_string(),
            price: "19.99".parse().unwrap(),
            is_featured: true,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };
        let view = ProductView {
            product,
            category: "Shirts".to_string(),
            size: "Medium".to_string(),
            colour: "#ffffff".to_string(),
            colour_name: "White".to_string(),
            images: Vec::new(),
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["name"], "Linen shirt");
        assert_eq!(json["price"], "19.99");
        assert_eq!(json["isFeatured"], true);
        assert_eq!(json["colourName"], "White");
        assert!(json["images"].as_array().unwrap().is_empty());
    }
}
