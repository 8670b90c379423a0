//! Identity, CORS and request-id behaviour of the router.
//!
//! None of these requests reach the database.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::body::Body;
use axum::http::{Request, StatusCode};

use storedesk_core::StoreId;
use storedesk_integration_tests::{TestApp, body_text};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_owner_routes_require_identity() {
    let app = TestApp::new();
    let store_id = StoreId::generate();

    for uri in [
        "/api/stores".to_string(),
        format!("/api/stores/{store_id}"),
        format!("/api/{store_id}/orders"),
        format!("/api/{store_id}/dashboard"),
    ] {
        let response = app
            .send(Request::get(uri.as_str()).body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_catalog_writes_require_identity() {
    let app = TestApp::new();
    let store_id = StoreId::generate();

    for resource in ["billboards", "categories", "sizes", "colours", "products"] {
        let response = app
            .send(
                Request::post(format!("/api/{store_id}/{resource}"))
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{resource}");
    }
}

#[tokio::test]
async fn test_blank_identity_header_is_unauthorized() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::get("/api/stores")
                .header("x-user-id", "   ")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_checkout_preflight_allows_any_origin() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::options(format!("/api/{}/checkout", StoreId::generate()))
                .header("origin", "https://some-storefront.test")
                .header("access-control-request-method", "POST")
                .header("access-control-request-headers", "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("POST"));
}

#[tokio::test]
async fn test_request_id_round_trip() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::get("/health")
                .header("x-request-id", "req-abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.headers()["x-request-id"], "req-abc-123");

    let response = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert!(response.headers().contains_key("x-request-id"));
}
