//! Checkout through payment confirmation, over the full router.
//!
//! Run with: cargo test -p storedesk-integration-tests

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use storedesk_admin::payments::RecordingGateway;
use storedesk_core::{OrderId, ProductId, StoreId};
use storedesk_integration_tests::{
    TestApp, WEBHOOK_SECRET, body_text, completed_event, post_json, sign, signed_webhook,
};

async fn seeded() -> (TestApp, StoreId, ProductId, ProductId) {
    let app = TestApp::new();
    let store = app.ledger.insert_store("Corner Shop", "user_owner").await;
    let shirt = app
        .ledger
        .insert_product(store.id, "Linen shirt", "45.00".parse().unwrap())
        .await;
    let hat = app
        .ledger
        .insert_product(store.id, "Straw hat", "19.99".parse().unwrap())
        .await;
    (app, store.id, shirt, hat)
}

fn checkout_uri(store_id: StoreId) -> String {
    format!("/api/{store_id}/checkout")
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_creates_pending_order_and_session() {
    let (app, store_id, shirt, hat) = seeded().await;

    let response = app
        .send(post_json(
            &checkout_uri(store_id),
            &json!({ "productIds": [shirt.to_string(), hat.to_string()] }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("https://checkout.stripe.test/pay/"));

    let orders = app.ledger.orders(store_id).await;
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert!(!order.made_payment);
    assert_eq!(order.phone_no, "");
    assert_eq!(order.address, "");
    assert_eq!(app.ledger.order_items(order.id).await.len(), 2);

    let requests = app.gateway.requests().await;
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.order_id, order.id);
    assert_eq!(request.line_items[0].unit_amount, 4500);
    assert_eq!(request.line_items[1].unit_amount, 1999);
    assert_eq!(request.success_url, "https://shop.test/carts?success=1");
    assert_eq!(request.cancel_url, "https://shop.test/carts?cancelled=1");
}

#[tokio::test]
async fn test_checkout_uses_caller_redirects() {
    let (app, store_id, shirt, _) = seeded().await;

    let response = app
        .send(post_json(
            &checkout_uri(store_id),
            &json!({
                "productIds": [shirt.to_string()],
                "callbackUrls": {
                    "confirmationUrl": "https://shop.test/thanks",
                    "cancellationUrl": "https://shop.test/basket"
                }
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let request = &app.gateway.requests().await[0];
    assert_eq!(request.success_url, "https://shop.test/thanks");
    assert_eq!(request.cancel_url, "https://shop.test/basket");
}

#[tokio::test]
async fn test_checkout_rejects_empty_cart() {
    let (app, store_id, _, _) = seeded().await;

    let response = app
        .send(post_json(&checkout_uri(store_id), &json!({ "productIds": [] })))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.ledger.item_count().await, 0);
    assert!(app.gateway.requests().await.is_empty());
}

#[tokio::test]
async fn test_checkout_rejects_bad_store_id() {
    let app = TestApp::new();
    let response = app
        .send(post_json(
            "/api/not-a-uuid/checkout",
            &json!({ "productIds": [ProductId::generate().to_string()] }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Invalid store Id type");
}

#[tokio::test]
async fn test_checkout_bad_store_id_checked_before_body() {
    let app = TestApp::new();

    let malformed = app
        .send(
            Request::post("/api/not-a-uuid/checkout")
                .header("content-type", "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(malformed).await, "Invalid store Id type");

    let missing = app
        .send(
            Request::post("/api/not-a-uuid/checkout")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(missing).await, "Invalid store Id type");
}

#[tokio::test]
async fn test_checkout_malformed_body_rejected() {
    let (app, store_id, _, _) = seeded().await;

    let response = app
        .send(
            Request::post(checkout_uri(store_id))
                .header("content-type", "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(
            Request::post(checkout_uri(store_id))
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(app.ledger.orders(store_id).await.is_empty());
}

#[tokio::test]
async fn test_checkout_rejects_one_product_spelled_twice() {
    let (app, store_id, shirt, _) = seeded().await;

    let response = app
        .send(post_json(
            &checkout_uri(store_id),
            &json!({ "productIds": [shirt.to_string(), shirt.to_string().replace('-', "")] }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.ledger.orders(store_id).await.is_empty());
    assert!(app.gateway.requests().await.is_empty());
}

#[tokio::test]
async fn test_checkout_unknown_store() {
    let app = TestApp::new();
    let response = app
        .send(post_json(
            &checkout_uri(StoreId::generate()),
            &json!({ "productIds": [ProductId::generate().to_string()] }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Store not exist");
}

#[tokio::test]
async fn test_checkout_unavailable_products_conflict() {
    let (app, store_id, shirt, _) = seeded().await;
    let ghost = ProductId::generate();

    let response = app
        .send(post_json(
            &checkout_uri(store_id),
            &json!({ "productIds": [shirt.to_string(), ghost.to_string()] }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body_text(response).await.contains(&ghost.to_string()));

    assert!(app.ledger.orders(store_id).await.is_empty());
    assert!(app.gateway.requests().await.is_empty());
}

#[tokio::test]
async fn test_checkout_products_from_other_store_are_unavailable() {
    let (app, store_id, _, _) = seeded().await;
    let other = app.ledger.insert_store("Other Shop", "user_other").await;
    let foreign = app
        .ledger
        .insert_product(other.id, "Kettle", "30.00".parse().unwrap())
        .await;

    let response = app
        .send(post_json(
            &checkout_uri(store_id),
            &json!({ "productIds": [foreign.to_string()] }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_checkout_rejects_recent_duplicate() {
    let (app, store_id, shirt, _) = seeded().await;
    let body = json!({ "productIds": [shirt.to_string()] });

    let first = app.send(post_json(&checkout_uri(store_id), &body)).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.send(post_json(&checkout_uri(store_id), &body)).await;
    assert_eq!(second.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_text(second).await, "Possible duplicate order");
    assert_eq!(app.ledger.orders(store_id).await.len(), 1);
}

#[tokio::test]
async fn test_checkout_allowed_once_window_passes() {
    let (app, store_id, shirt, _) = seeded().await;
    let body = json!({ "productIds": [shirt.to_string()] });

    app.send(post_json(&checkout_uri(store_id), &body)).await;
    let first = app.ledger.orders(store_id).await[0].id;
    app.ledger
        .set_order_created_at(first, Some(Utc::now() - Duration::minutes(10)))
        .await;

    let again = app.send(post_json(&checkout_uri(store_id), &body)).await;
    assert_eq!(again.status(), StatusCode::OK);
    assert_eq!(app.ledger.orders(store_id).await.len(), 2);
}

#[tokio::test]
async fn test_checkout_gateway_failure_is_bad_gateway() {
    let app = TestApp::with_gateway(RecordingGateway::failing());
    let store = app.ledger.insert_store("Corner Shop", "user_owner").await;
    let shirt = app
        .ledger
        .insert_product(store.id, "Linen shirt", "45.00".parse().unwrap())
        .await;

    let response = app
        .send(post_json(
            &checkout_uri(store.id),
            &json!({ "productIds": [shirt.to_string()] }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_text(response).await, "External service error");
}

// ============================================================================
// Webhook
// ============================================================================

async fn checkout_one(app: &TestApp, store_id: StoreId, product: ProductId) -> OrderId {
    let response = app
        .send(post_json(
            &checkout_uri(store_id),
            &json!({ "productIds": [product.to_string()] }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    app.gateway.requests().await.last().unwrap().order_id
}

#[tokio::test]
async fn test_webhook_confirms_order_and_archives_products() {
    let (app, store_id, shirt, hat) = seeded().await;
    let order_id = checkout_one(&app, store_id, shirt).await;

    let event = completed_event(&order_id.to_string(), Some("+44 7700 900123"));
    let response = app.send(signed_webhook(&event)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let order = app.ledger.order(order_id).await.unwrap();
    assert!(order.made_payment);
    assert_eq!(order.phone_no, "+44 7700 900123");
    assert_eq!(order.address, "12 Harbour Rd, Portsmouth, PO1 2AB, GB");
    assert_eq!(app.ledger.is_archived(shirt).await, Some(true));
    assert_eq!(app.ledger.is_archived(hat).await, Some(false));
}

#[tokio::test]
async fn test_webhook_replay_converges() {
    let (app, store_id, shirt, _) = seeded().await;
    let order_id = checkout_one(&app, store_id, shirt).await;
    let event = completed_event(&order_id.to_string(), Some("+1 555 0100"));

    assert_eq!(app.send(signed_webhook(&event)).await.status(), StatusCode::OK);
    let once = app.ledger.order(order_id).await.unwrap();
    assert_eq!(app.send(signed_webhook(&event)).await.status(), StatusCode::OK);
    let twice = app.ledger.order(order_id).await.unwrap();

    assert_eq!(once.made_payment, twice.made_payment);
    assert_eq!(once.phone_no, twice.phone_no);
    assert_eq!(once.address, twice.address);
    assert_eq!(app.ledger.is_archived(shirt).await, Some(true));
}

#[tokio::test]
async fn test_archived_product_cannot_be_bought_again() {
    let (app, store_id, shirt, _) = seeded().await;
    let order_id = checkout_one(&app, store_id, shirt).await;
    app.send(signed_webhook(&completed_event(&order_id.to_string(), None)))
        .await;
    app.ledger
        .set_order_created_at(order_id, Some(Utc::now() - Duration::hours(1)))
        .await;

    let response = app
        .send(post_json(
            &checkout_uri(store_id),
            &json!({ "productIds": [shirt.to_string()] }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_webhook_bad_signature_is_rejected() {
    let (app, store_id, shirt, _) = seeded().await;
    let order_id = checkout_one(&app, store_id, shirt).await;

    let payload = completed_event(&order_id.to_string(), None).to_string();
    let request = Request::post("/api/webhook")
        .header(
            "stripe-signature",
            sign(&payload, "whsec_someone_else", Utc::now()),
        )
        .body(Body::from(payload))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.starts_with("Webhook Error:"));
    assert!(!app.ledger.order(order_id).await.unwrap().made_payment);
    assert_eq!(app.ledger.is_archived(shirt).await, Some(false));
}

#[tokio::test]
async fn test_webhook_missing_signature_is_rejected() {
    let app = TestApp::new();
    let request = Request::post("/api/webhook")
        .body(Body::from(completed_event("x", None).to_string()))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_text(response).await,
        "Webhook Error: Missing Stripe-Signature header"
    );
}

#[tokio::test]
async fn test_webhook_stale_signature_is_rejected() {
    let app = TestApp::new();
    let payload = completed_event(&OrderId::generate().to_string(), None).to_string();
    let request = Request::post("/api/webhook")
        .header(
            "stripe-signature",
            sign(&payload, WEBHOOK_SECRET, Utc::now() - Duration::hours(1)),
        )
        .body(Body::from(payload))
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_other_events_are_acknowledged() {
    let (app, store_id, shirt, _) = seeded().await;
    let order_id = checkout_one(&app, store_id, shirt).await;

    let mut event = completed_event(&order_id.to_string(), None);
    event["type"] = json!("payment_intent.created");
    let response = app.send(signed_webhook(&event)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!app.ledger.order(order_id).await.unwrap().made_payment);
}

#[tokio::test]
async fn test_webhook_unknown_order_is_acknowledged() {
    let app = TestApp::new();
    let event = completed_event(&OrderId::generate().to_string(), None);
    assert_eq!(app.send(signed_webhook(&event)).await.status(), StatusCode::OK);
}
