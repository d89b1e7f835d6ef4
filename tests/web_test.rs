//! Router tests driven through `tower::ServiceExt::oneshot`.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{system_with, test_config, Failure, StubCatalog};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn router_for(catalog: StubCatalog) -> (Router, similar_products::SimilarProductsSystem) {
    let system = system_with(Arc::new(catalog), &test_config());
    (system.router("test"), system)
}

async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_similar_products_endpoint() {
    let (router, _) = router_for(
        StubCatalog::new()
            .with_similar("1", &["2", "3", "4"])
            .with_detail("2", "Dress", 19.99, true)
            .with_detail_not_found("3")
            .with_detail("4", "Boots", 39.99, false),
    );

    let (status, body) = get_json(router, "/product/1/similar").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"id": "2", "name": "Dress", "price": 19.99, "availability": true},
            {"id": "4", "name": "Boots", "price": 39.99, "availability": false}
        ])
    );
}

#[tokio::test]
async fn test_unknown_product_returns_empty_array() {
    let (router, _) = router_for(StubCatalog::new());

    let (status, body) = get_json(router, "/product/999/similar").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_retrieval_failure_returns_bad_gateway() {
    let (router, _) = router_for(StubCatalog::new().with_similar_failure("1", Failure::Malformed));

    let (status, body) = get_json(router, "/product/1/similar").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "SIMILAR_PRODUCTS_RETRIEVAL_FAILED");
    assert_eq!(
        body["message"],
        "Failed to retrieve similar products for: 1"
    );
}

#[tokio::test]
async fn test_health_reports_breaker_and_store() {
    let (router, system) = router_for(
        StubCatalog::new()
            .with_similar("1", &["2"])
            .with_detail("2", "Dress", 19.99, true),
    );

    let (status, _) = get_json(router.clone(), "/product/1/similar").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_json(router.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["environment"], "test");
    assert_eq!(body["circuit_breaker"]["name"], "productDetailCB");
    assert_eq!(body["circuit_breaker"]["state"], "Closed");
    assert_eq!(body["detail_store"]["misses"], 1);

    system.circuit_breaker.force_open();
    let (status, body) = get_json(router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["circuit_breaker"]["state"], "Open");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (router, _) = router_for(StubCatalog::new());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/product/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
