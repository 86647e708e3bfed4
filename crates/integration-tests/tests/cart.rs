//! Cart and checkout over HTTP.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use qkart_core::Money;
use qkart_integration_tests::{TestApp, TestClient, demo_products};

async fn logged_in(app: &TestApp, email: &str) -> TestClient {
    let mut client = app.client();
    client.register(email).await;
    client
}

fn quantities(cart: &serde_json::Value) -> Vec<(i64, i64)> {
    cart["cartItems"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| {
            (
                item["product"]["_id"].as_i64().unwrap(),
                item["quantity"].as_i64().unwrap(),
            )
        })
        .collect()
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_cart_requires_login() {
    let app = TestApp::new();
    let mut client = app.client();

    for response in [
        client.get("/v1/cart").await,
        client.add(1, 1).await,
        client.update(1, 1).await,
        client.checkout().await,
    ] {
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["code"], 401);
        assert_eq!(response.message(), "Please authenticate");
    }
}

// ============================================================================
// Get
// ============================================================================

#[tokio::test]
async fn test_get_cart_without_cart_is_not_found() {
    let app = TestApp::new();
    let mut client = logged_in(&app, "nocart@example.com").await;

    let response = client.get("/v1/cart").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["code"], 404);
    assert_eq!(response.message(), "User does not have a cart");
}

#[tokio::test]
async fn test_get_cart_twice_is_stable() {
    let app = TestApp::new();
    let mut client = logged_in(&app, "stable@example.com").await;
    client.add(1, 2).await;
    client.add(2, 1).await;

    let first = client.get("/v1/cart").await;
    let second = client.get("/v1/cart").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, second.body);
}

// ============================================================================
// Add
// ============================================================================

#[tokio::test]
async fn test_add_creates_cart_with_snapshot() {
    let app = TestApp::new();
    let mut client = logged_in(&app, "add@example.com").await;

    let response = client.add(2, 3).await;
    assert_eq!(response.status, StatusCode::CREATED);

    let cart = &response.body;
    assert_eq!(cart["email"], "add@example.com");
    assert_eq!(cart["paymentOption"], "PAYMENT_OPTION_DEFAULT");
    assert_eq!(quantities(cart), vec![(2, 3)]);
    assert_eq!(
        cart["cartItems"][0]["product"]["name"],
        "Tan Leatherette Weekender Duffle"
    );
}

#[tokio::test]
async fn test_catalog_changes_do_not_reach_existing_items() {
    let app = TestApp::new();
    let mut client = app.client();
    let id = client.register_with_address("snapshot@example.com").await;
    client.add(1, 2).await;

    let mut repriced = demo_products().remove(0);
    repriced.cost = Money::whole(200);
    repriced.name = "Renamed Racquet".to_owned();
    app.catalog.upsert(repriced).await;

    let cart = client.get("/v1/cart").await.body;
    assert_eq!(cart["cartItems"][0]["product"]["cost"], 20);
    assert_eq!(
        cart["cartItems"][0]["product"]["name"],
        "YONEX Smash Badminton Racquet"
    );

    assert_eq!(client.checkout().await.status, StatusCode::NO_CONTENT);
    assert_eq!(client.wallet(id).await, Money::whole(460));
}

#[tokio::test]
async fn test_add_same_product_twice_leaves_cart_unchanged() {
    let app = TestApp::new();
    let mut client = logged_in(&app, "dup@example.com").await;
    client.add(1, 2).await;
    client.add(3, 1).await;
    let before = client.get("/v1/cart").await.body;

    let response = client.add(1, 5).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.message(),
        "Product already in cart. Use the cart sidebar to update or remove product from cart"
    );

    let after = client.get("/v1/cart").await.body;
    assert_eq!(quantities(&after), quantities(&before));
}

#[tokio::test]
async fn test_add_unknown_product() {
    let app = TestApp::new();
    let mut client = logged_in(&app, "unknown@example.com").await;

    let response = client.add(999, 1).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Product doesn't exist in database");

    // No cart was created
    assert_eq!(client.get("/v1/cart").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_rejects_non_positive_quantity() {
    let app = TestApp::new();
    let mut client = logged_in(&app, "zero@example.com").await;

    assert_eq!(client.add(1, 0).await.status, StatusCode::BAD_REQUEST);
    assert_eq!(client.add(1, -2).await.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = TestApp::new();
    let mut client = logged_in(&app, "malformed@example.com").await;

    let response = client.post("/v1/cart", json!({ "productId": 1 })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], 400);
}

// ============================================================================
// Update / Delete
// ============================================================================

#[tokio::test]
async fn test_update_quantity() {
    let app = TestApp::new();
    let mut client = logged_in(&app, "update@example.com").await;
    client.add(1, 1).await;
    client.add(2, 1).await;

    let response = client.update(2, 4).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(quantities(&response.body), vec![(1, 1), (2, 4)]);
}

#[tokio::test]
async fn test_update_without_cart() {
    let app = TestApp::new();
    let mut client = logged_in(&app, "nocart-update@example.com").await;

    let response = client.update(1, 2).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.message(),
        "User does not have a cart. Use POST to create cart and add a product"
    );
}

#[tokio::test]
async fn test_update_product_not_in_cart_changes_nothing() {
    let app = TestApp::new();
    let mut client = logged_in(&app, "notincart@example.com").await;
    client.add(1, 2).await;

    let response = client.update(3, 1).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Product not in cart");

    let cart = client.get("/v1/cart").await.body;
    assert_eq!(quantities(&cart), vec![(1, 2)]);
}

#[tokio::test]
async fn test_update_to_zero_removes_only_that_item() {
    let app = TestApp::new();
    let mut client = logged_in(&app, "remove@example.com").await;
    client.add(1, 2).await;
    client.add(2, 3).await;
    client.add(3, 1).await;

    let response = client.update(2, 0).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let cart = client.get("/v1/cart").await.body;
    assert_eq!(quantities(&cart), vec![(1, 2), (3, 1)]);
}

#[tokio::test]
async fn test_remove_absent_product_fails() {
    let app = TestApp::new();
    let mut client = logged_in(&app, "remove-absent@example.com").await;
    client.add(1, 2).await;

    let response = client.update(2, 0).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Product not in cart");

    let cart = client.get("/v1/cart").await.body;
    assert_eq!(quantities(&cart), vec![(1, 2)]);
}

#[tokio::test]
async fn test_update_negative_quantity_is_rejected() {
    let app = TestApp::new();
    let mut client = logged_in(&app, "negative@example.com").await;
    client.add(1, 2).await;

    let response = client.update(1, -1).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let cart = client.get("/v1/cart").await.body;
    assert_eq!(quantities(&cart), vec![(1, 2)]);
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_debits_wallet_and_empties_cart() {
    let app = TestApp::new();
    let mut client = app.client();
    let id = client.register_with_address("buyer@example.com").await;

    // Two of product 1 at 20 each
    client.add(1, 2).await;

    let response = client.checkout().await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    assert_eq!(client.wallet(id).await, Money::whole(460));

    let cart = client.get("/v1/cart").await;
    assert_eq!(cart.status, StatusCode::OK);
    assert!(cart.body["cartItems"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_without_cart() {
    let app = TestApp::new();
    let mut client = app.client();
    client.register_with_address("nocart-checkout@example.com").await;

    let response = client.checkout().await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), "User does not have a cart");
}

#[tokio::test]
async fn test_checkout_empty_cart_keeps_wallet() {
    let app = TestApp::new();
    let mut client = app.client();
    let id = client.register_with_address("empty@example.com").await;
    client.add(1, 1).await;
    client.update(1, 0).await;

    let response = client.checkout().await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.message(),
        "User does not have any products added in the cart"
    );
    assert_eq!(client.wallet(id).await, Money::whole(500));
}

#[tokio::test]
async fn test_checkout_requires_address_even_with_funds() {
    let app = TestApp::new();
    let mut client = app.client();
    let id = client.register("noaddress@example.com").await;
    client.add(1, 1).await;

    let response = client.checkout().await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Set User address first");
    assert_eq!(client.wallet(id).await, Money::whole(500));
}

#[tokio::test]
async fn test_address_is_checked_before_funds() {
    let app = TestApp::new();
    let mut client = app.client();
    client.register("broke@example.com").await;
    client.add(3, 5).await;

    let response = client.checkout().await;
    assert_eq!(response.message(), "Set User address first");
}

#[tokio::test]
async fn test_checkout_insufficient_funds() {
    let app = TestApp::new();
    let mut client = app.client();
    let id = client.register_with_address("poor@example.com").await;
    client.add(3, 2).await;

    let response = client.checkout().await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Insufficient funds in user's wallet");

    assert_eq!(client.wallet(id).await, Money::whole(500));
    let cart = client.get("/v1/cart").await.body;
    assert_eq!(quantities(&cart), vec![(3, 2)]);
}

#[tokio::test]
async fn test_checkout_after_wallet_top_up() {
    let app = TestApp::new();
    let mut client = app.client();
    let id = client.register_with_address("topup@example.com").await;
    client.add(3, 2).await;

    app.set_wallet("topup@example.com", 1000).await;

    assert_eq!(client.checkout().await.status, StatusCode::NO_CONTENT);
    assert_eq!(client.wallet(id).await, Money::whole(400));
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let app = TestApp::new();
    let mut alice = logged_in(&app, "alice@example.com").await;
    let mut bob = logged_in(&app, "bob@example.com").await;

    alice.add(1, 1).await;

    assert_eq!(bob.get("/v1/cart").await.status, StatusCode::NOT_FOUND);
    assert_eq!(bob.add(1, 3).await.status, StatusCode::CREATED);

    let alice_cart = alice.get("/v1/cart").await.body;
    assert_eq!(quantities(&alice_cart), vec![(1, 1)]);
}
