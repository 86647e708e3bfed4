//! Product catalog and health endpoints.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use qkart_integration_tests::TestApp;

#[tokio::test]
async fn test_list_products() {
    let app = TestApp::new();
    let response = app.client().get("/v1/products").await;

    assert_eq!(response.status, StatusCode::OK);
    let products = response.body.as_array().unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(products[0]["_id"], 1);
    assert_eq!(products[0]["cost"], 20);
    assert_eq!(products[0]["category"], "Sports");
}

#[tokio::test]
async fn test_show_product() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get("/v1/products/2").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["name"], "Tan Leatherette Weekender Duffle");
    assert_eq!(response.body["rating"], 4);

    let response = client.get("/v1/products/42").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["code"], 404);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let mut client = app.client();

    assert_eq!(client.get("/health").await.status, StatusCode::OK);
    assert_eq!(client.get("/health/ready").await.status, StatusCode::OK);
}
