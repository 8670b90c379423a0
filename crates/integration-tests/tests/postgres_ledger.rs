//! Ledger and repository tests against a real `PostgreSQL`.
//!
//! These tests require a migrated, disposable database:
//!
//! ```bash
//! export STOREDESK_TEST_DATABASE_URL=postgres://localhost/storedesk_test
//! sd-cli migrate   # with STOREDESK_DATABASE_URL pointing at the same database
//! cargo test -p storedesk-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use chrono::{Duration, Utc};
use secrecy::SecretString;
use sqlx::PgPool;

use storedesk_admin::db::{
    BillboardInput, BillboardRepository, CategoryInput, CategoryRepository, ColourInput,
    ColourRepository, OrderRepository, ProductFilter, ProductInput, ProductRepository, SizeInput,
    SizeRepository, StoreRepository,
};
use storedesk_admin::ledger::{OrderLedger, PaymentConfirmation, PgLedger};
use storedesk_admin::models::{ProductView, Store};
use storedesk_core::ProductId;

async fn pool() -> PgPool {
    let url = std::env::var("STOREDESK_TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("STOREDESK_TEST_DATABASE_URL or DATABASE_URL must point at a migrated test database");
    storedesk_admin::db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database")
}

/// A store with one billboard, category, size and colour, named uniquely.
struct Fixture {
    store: Store,
    products: Vec<ProductView>,
}

async fn fixture(pool: &PgPool, prices: &[&str]) -> Fixture {
    let suffix = ProductId::generate();
    let store = StoreRepository::new(pool)
        .create(&format!("Test store {suffix}"), "user_integration")
        .await
        .unwrap();

    let billboard = BillboardRepository::new(pool)
        .create(
            store.id,
            &BillboardInput {
                label: "Summer".to_string(),
                image_url: "https://img.test/summer.png".to_string(),
            },
        )
        .await
        .unwrap();
    let category = CategoryRepository::new(pool)
        .create(
            store.id,
            &CategoryInput {
                name: "Shirts".to_string(),
                billboard_id: billboard.id,
            },
        )
        .await
        .unwrap();
    let size = SizeRepository::new(pool)
        .create(
            store.id,
            &SizeInput {
                name: "Medium".to_string(),
                value: "M".to_string(),
            },
        )
        .await
        .unwrap();
    let colour = ColourRepository::new(pool)
        .create(
            store.id,
            &ColourInput {
                name: "Navy".to_string(),
                value: "#000080".to_string(),
            },
        )
        .await
        .unwrap();

    let repo = ProductRepository::new(pool);
    let mut products = Vec::new();
    for (i, price) in prices.iter().enumerate() {
        let product = repo
            .create(
                store.id,
                &ProductInput {
                    name: format!("Shirt {i}"),
                    price: price.parse().unwrap(),
                    category_id: category.id,
                    size_id: size.id,
                    colour_id: colour.id,
                    is_featured: i == 0,
                    is_archived: false,
                    image_urls: vec![format!("https://img.test/shirt-{i}.png")],
                },
            )
            .await
            .unwrap();
        products.push(product);
    }

    Fixture { store, products }
}

async fn cleanup(pool: &PgPool, store: &Store) {
    let _ = StoreRepository::new(pool).delete(store.id).await;
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL test database"]
async fn test_pending_order_then_confirmation() {
    let pool = pool().await;
    let fx = fixture(&pool, &["45.00", "19.99"]).await;
    let ledger = PgLedger::new(pool.clone());
    let ids: Vec<ProductId> = fx.products.iter().map(|p| p.product.id).collect();

    let found = ledger.find_products(fx.store.id, &ids).await.unwrap();
    assert_eq!(found.len(), 2);

    let order = ledger.create_pending_order(fx.store.id, &ids).await.unwrap();
    assert!(!order.made_payment);
    assert_eq!(order.phone_no, "");

    let confirmation = PaymentConfirmation {
        address: "12 Harbour Rd, Portsmouth, GB".to_string(),
        phone: "+44 7700 900123".to_string(),
    };
    let archived = ledger
        .confirm_payment(order.id, &confirmation)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(archived.len(), 2);

    // Replaying converges
    ledger
        .confirm_payment(order.id, &confirmation)
        .await
        .unwrap()
        .unwrap();

    assert!(ledger.find_products(fx.store.id, &ids).await.unwrap().is_empty());

    let summaries = OrderRepository::new(&pool)
        .list_summaries(fx.store.id)
        .await
        .unwrap();
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].is_paid);
    assert_eq!(summaries[0].total_price, "$64.99");
    assert_eq!(summaries[0].phone, "+44 7700 900123");

    cleanup(&pool, &fx.store).await;
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL test database"]
async fn test_repeated_product_in_order_is_conflict() {
    let pool = pool().await;
    let fx = fixture(&pool, &["10.00"]).await;
    let ledger = PgLedger::new(pool.clone());
    let id = fx.products[0].product.id;

    let err = ledger
        .create_pending_order(fx.store.id, &[id, id])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Duplicate product in order"));
    assert!(
        ledger
            .recent_orders(fx.store.id, &[id], Utc::now() - Duration::hours(1))
            .await
            .unwrap()
            .is_empty()
    );

    cleanup(&pool, &fx.store).await;
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL test database"]
async fn test_recent_orders_respects_cutoff() {
    let pool = pool().await;
    let fx = fixture(&pool, &["10.00", "12.00"]).await;
    let ledger = PgLedger::new(pool.clone());
    let first = fx.products[0].product.id;
    let second = fx.products[1].product.id;

    let order = ledger
        .create_pending_order(fx.store.id, &[first, second])
        .await
        .unwrap();

    let recent = ledger
        .recent_orders(fx.store.id, &[first], Utc::now() - Duration::minutes(2))
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, order.id);
    assert_eq!(recent[0].product_ids, vec![first]);

    let future_cutoff = ledger
        .recent_orders(fx.store.id, &[first], Utc::now() + Duration::minutes(2))
        .await
        .unwrap();
    assert!(future_cutoff.is_empty());

    cleanup(&pool, &fx.store).await;
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL test database"]
async fn test_dashboard_stats() {
    let pool = pool().await;
    let fx = fixture(&pool, &["45.00", "19.99", "5.01"]).await;
    let ledger = PgLedger::new(pool.clone());
    let paid = fx.products[0].product.id;
    let unpaid = fx.products[1].product.id;

    let order = ledger.create_pending_order(fx.store.id, &[paid]).await.unwrap();
    ledger
        .confirm_payment(
            order.id,
            &PaymentConfirmation {
                address: String::new(),
                phone: String::new(),
            },
        )
        .await
        .unwrap();
    ledger.create_pending_order(fx.store.id, &[unpaid]).await.unwrap();

    let repo = OrderRepository::new(&pool);
    assert_eq!(repo.total_revenue(fx.store.id).await.unwrap().to_string(), "45.00");
    assert_eq!(repo.sales_count(fx.store.id).await.unwrap(), 1);
    assert_eq!(repo.stock_count(fx.store.id).await.unwrap(), 2);

    let graph = repo.monthly_revenue(fx.store.id).await.unwrap();
    assert_eq!(graph.len(), 12);
    let total: rust_decimal::Decimal = graph.iter().map(|p| p.total).sum();
    assert_eq!(total.to_string(), "45.00");

    cleanup(&pool, &fx.store).await;
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL test database"]
async fn test_product_filters() {
    let pool = pool().await;
    let fx = fixture(&pool, &["45.00", "19.99"]).await;
    let repo = ProductRepository::new(&pool);
    let featured = fx.products[0].product.id;

    let all = repo
        .list(fx.store.id, &ProductFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let only_featured = repo
        .list(
            fx.store.id,
            &ProductFilter {
                is_featured: Some(true),
                ..ProductFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(only_featured.len(), 1);
    assert_eq!(only_featured[0].product.id, featured);
    assert_eq!(only_featured[0].images.len(), 1);
    assert_eq!(only_featured[0].colour, "#000080");

    let excluding = repo
        .list(
            fx.store.id,
            &ProductFilter {
                exclude_id: Some(featured),
                ..ProductFilter::default()
            },
        )
        .await
        .unwrap();
    assert!(excluding.iter().all(|p| p.product.id != featured));

    cleanup(&pool, &fx.store).await;
}
