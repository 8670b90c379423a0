//! Product routes.
//!
//! Listing is public so storefronts can browse the catalog; the query string
//! narrows the list (`categoryId`, `sizeId`, `colourId`, `isFeatured`,
//! `isArchived`, `excludeId`). Archived products are hidden unless
//! `isArchived=true` is passed.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};

use storedesk_core::{CategoryId, ColourId, ProductId, SizeId, StoreId, Validated, ValidationErrors};

use crate::db::{
    CategoryRepository, ColourRepository, ProductFilter, ProductInput, ProductRepository,
    SizeRepository,
};
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::ProductView;
use crate::state::AppState;

use super::{find_store, owned_store, parse_id};

const MAX_NAME_CHARS: usize = 256;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/{store_id}/products",
            get(list_products).post(create_product),
        )
        .route(
            "/api/{store_id}/products/{product_id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

// =============================================================================
// API Types
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ImageRequest {
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<String>,
    pub size_id: Option<String>,
    pub colour_id: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_archived: bool,
    pub images: Option<Vec<ImageRequest>>,
}

impl ProductRequest {
    /// # Errors
    ///
    /// Fails on a missing or overlong name, a non-positive price, malformed
    /// references, or an empty or invalid image list.
    pub fn validate(self) -> Validated<ProductInput> {
        let mut errors = ValidationErrors::new();
        let name = errors.required_text("name", self.name.as_deref(), MAX_NAME_CHARS);
        let price = errors.positive_price("price", self.price);
        let category_id: Option<CategoryId> =
            errors.uuid("categoryId", self.category_id.as_deref());
        let size_id: Option<SizeId> = errors.uuid("sizeId", self.size_id.as_deref());
        let colour_id: Option<ColourId> = errors.uuid("colourId", self.colour_id.as_deref());

        let images = self.images.unwrap_or_default();
        if images.is_empty() {
            errors.add("images", "is required");
        }
        let image_urls: Vec<String> = images
            .iter()
            .enumerate()
            .filter_map(|(i, image)| {
                errors
                    .url(&format!("images[{i}].url"), image.url.as_deref())
                    .map(String::from)
            })
            .collect();

        match (name, price, category_id, size_id, colour_id) {
            (Some(name), Some(price), Some(category_id), Some(size_id), Some(colour_id))
                if errors.is_empty() =>
            {
                Ok(ProductInput {
                    name,
                    price,
                    category_id,
                    size_id,
                    colour_id,
                    is_featured: self.is_featured,
                    is_archived: self.is_archived,
                    image_urls,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Query string for the product list.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub category_id: Option<String>,
    pub size_id: Option<String>,
    pub colour_id: Option<String>,
    pub is_featured: Option<bool>,
    pub is_archived: Option<bool>,
    pub exclude_id: Option<String>,
}

impl ProductQuery {
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` when an id filter is not a UUID.
    pub fn into_filter(self) -> Result<ProductFilter, AppError> {
        Ok(ProductFilter {
            category_id: optional_id(self.category_id.as_deref(), "category")?,
            size_id: optional_id(self.size_id.as_deref(), "size")?,
            colour_id: optional_id(self.colour_id.as_deref(), "colour")?,
            is_featured: self.is_featured,
            is_archived: self.is_archived.unwrap_or(false),
            exclude_id: optional_id(self.exclude_id.as_deref(), "product")?,
        })
    }
}

fn optional_id<T: std::str::FromStr>(raw: Option<&str>, kind: &str) -> Result<Option<T>, AppError> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| parse_id(v, kind))
        .transpose()
}

fn invalid(errors: ValidationErrors) -> AppError {
    AppError::validation("Invalid product", errors)
}

/// Category, size and colour must all exist in the same store.
async fn ensure_references(
    state: &AppState,
    store_id: StoreId,
    input: &ProductInput,
) -> Result<(), AppError> {
    let pool = state.pool();
    if CategoryRepository::new(pool)
        .get(store_id, input.category_id)
        .await?
        .is_none()
    {
        return Err(AppError::Unprocessable("Category not exist".to_string()));
    }
    if SizeRepository::new(pool)
        .get(store_id, input.size_id)
        .await?
        .is_none()
    {
        return Err(AppError::Unprocessable("Size not exist".to_string()));
    }
    if ColourRepository::new(pool)
        .get(store_id, input.colour_id)
        .await?
        .is_none()
    {
        return Err(AppError::Unprocessable("Colour not exist".to_string()));
    }
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_products(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductView>>, AppError> {
    let store = find_store(&state, &store_id).await?;
    let filter = query.into_filter()?;
    let products = ProductRepository::new(state.pool())
        .list(store.id, &filter)
        .await?;
    Ok(Json(products))
}

async fn get_product(
    State(state): State<AppState>,
    Path((store_id, product_id)): Path<(String, String)>,
) -> Result<Json<ProductView>, AppError> {
    let store = find_store(&state, &store_id).await?;
    let id: ProductId = parse_id(&product_id, "product")?;
    ProductRepository::new(state.pool())
        .get(store.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not exist".to_string()))
}

#[instrument(skip_all)]
async fn create_product(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(store_id): Path<String>,
    Json(request): Json<ProductRequest>,
) -> Result<Json<ProductView>, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let input = request.validate().map_err(invalid)?;
    ensure_references(&state, store.id, &input).await?;

    let product = ProductRepository::new(state.pool())
        .create(store.id, &input)
        .await?;
    Ok(Json(product))
}

#[instrument(skip_all)]
async fn update_product(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path((store_id, product_id)): Path<(String, String)>,
    Json(request): Json<ProductRequest>,
) -> Result<Json<ProductView>, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let id: ProductId = parse_id(&product_id, "product")?;
    let input = request.validate().map_err(invalid)?;

    let repo = ProductRepository::new(state.pool());
    let existing = repo
        .get(store.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not exist".to_string()))?;
    if input.matches(&existing) {
        return Err(AppError::Conflict("Product already updated".to_string()));
    }
    ensure_references(&state, store.id, &input).await?;

    let product = repo.update(store.id, id, &input).await?;
    info!(product_id = %id, "Product updated");
    Ok(Json(product))
}

#[instrument(skip_all)]
async fn delete_product(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path((store_id, product_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let id: ProductId = parse_id(&product_id, "product")?;
    ProductRepository::new(state.pool())
        .delete(store.id, id)
        .await?;
    info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_request() -> ProductRequest {
        ProductRequest {
            name: Some("Linen shirt".to_string()),
            price: Some(Decimal::new(4500, 2)),
            category_id: Some(CategoryId::generate().to_string()),
            size_id: Some(SizeId::generate().to_string()),
            colour_id: Some(ColourId::generate().to_string()),
            is_featured: true,
            is_archived: false,
            images: Some(vec![ImageRequest {
                url: Some("https://img.test/shirt.png".to_string()),
            }]),
        }
    }

    #[test]
    fn test_product_request_valid() {
        let input = valid_request().validate().unwrap();
        assert_eq!(input.name, "Linen shirt");
        assert_eq!(input.image_urls, vec!["https://img.test/shirt.png"]);
        assert!(input.is_featured);
    }

    #[test]
    fn test_product_request_requires_images() {
        let mut request = valid_request();
        request.images = Some(Vec::new());
        let err = request.validate().unwrap_err();
        assert!(err.has_field("images"));
    }

    #[test]
    fn test_product_request_reports_each_bad_field() {
        let request = ProductRequest {
            price: Some(Decimal::ZERO),
            category_id: Some("shoes".to_string()),
            images: Some(vec![ImageRequest { url: None }]),
            ..ProductRequest::default()
        };
        let err = request.validate().unwrap_err();
        assert!(err.has_field("name"));
        assert!(err.has_field("price"));
        assert!(err.has_field("categoryId"));
        assert!(err.has_field("sizeId"));
        assert!(err.has_field("colourId"));
        assert!(err.has_field("images[0].url"));
    }

    #[test]
    fn test_product_query_defaults_hide_archived() {
        let filter = ProductQuery::default().into_filter().unwrap();
        assert_eq!(filter, ProductFilter::default());
        assert!(!filter.is_archived);
    }

    #[test]
    fn test_product_query_rejects_bad_ids() {
        let query = ProductQuery {
            colour_id: Some("red".to_string()),
            ..ProductQuery::default()
        };
        let err = query.into_filter().unwrap_err();
        assert_eq!(err.to_string(), "Invalid colour Id type");
    }
}
