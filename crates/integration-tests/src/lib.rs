//! Integration test harness for QKart.
//!
//! [`TestApp`] builds the real storefront router over in-memory stores and a
//! `MemoryStore` session layer, then drives it in-process with
//! `tower::ServiceExt::oneshot`. Each [`TestClient`] keeps its own session
//! cookie, so one app can host several logged-in users.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests
//! cargo test -p qkart-integration-tests
//!
//! # Smoke tests against a running server
//! QKART_BASE_URL=http://localhost:8082 cargo test -p qkart-integration-tests -- --ignored
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use qkart_core::{Email, Money, Product, ProductId};
use qkart_storefront::config::StorefrontConfig;
use qkart_storefront::db::memory::{MemoryCartStore, MemoryCatalog, MemoryUserStore};
use qkart_storefront::middleware::session::{SESSION_COOKIE_NAME, session_layer};
use qkart_storefront::routes;
use qkart_storefront::state::AppState;

/// Password used by [`TestClient::register`].
pub const PASSWORD: &str = "password1";

/// An address long enough to pass validation.
pub const ADDRESS: &str = "221B Baker Street, London NW1 6XE";

/// Catalog fixtures: ids 1 to 3, costing 20, 50 and 300.
#[must_use]
pub fn demo_products() -> Vec<Product> {
    [
        (1, "YONEX Smash Badminton Racquet", "Sports", 5, 20),
        (2, "Tan Leatherette Weekender Duffle", "Fashion", 4, 50),
        (3, "Atomberg Ceiling Fan", "Home & Kitchen", 3, 300),
    ]
    .into_iter()
    .map(|(id, name, category, rating, cost)| Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        category: category.to_owned(),
        rating,
        cost: Money::whole(cost),
        image: format!("https://images.example.com/products/{id}.png"),
    })
    .collect()
}

/// The storefront wired to in-memory stores.
pub struct TestApp {
    router: Router,
    pub catalog: Arc<MemoryCatalog>,
    pub carts: Arc<MemoryCartStore>,
    pub users: Arc<MemoryUserStore>,
}

impl TestApp {
    /// Build an app over [`demo_products`] with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StorefrontConfig::local())
    }

    /// Build an app over [`demo_products`] with a custom configuration.
    #[must_use]
    pub fn with_config(config: StorefrontConfig) -> Self {
        let catalog = Arc::new(MemoryCatalog::with_products(demo_products()));
        let carts = Arc::new(MemoryCartStore::new());
        let users = Arc::new(MemoryUserStore::new());

        let sessions = session_layer(MemoryStore::default(), &config);
        let state = AppState::in_memory(config, catalog.clone(), carts.clone(), users.clone());
        let router = routes::routes().layer(sessions).with_state(state);

        Self {
            router,
            catalog,
            carts,
            users,
        }
    }

    /// A client with an empty cookie jar.
    #[must_use]
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }

    /// Overwrite a user's wallet balance directly in the store.
    pub async fn set_wallet(&self, email: &str, amount: u32) {
        let email = Email::parse(email).unwrap();
        self.users
            .set_wallet(&email, Money::whole(amount))
            .await
            .unwrap();
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    /// JSON body, or `Value::Null` when the body is empty or not JSON.
    pub body: Value,
}

impl TestResponse {
    /// The `message` field of an error body.
    #[must_use]
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

/// Sends requests to a [`TestApp`], carrying the session cookie.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    /// Send a request with an optional JSON body.
    pub async fn request(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        self.remember_cookie(response.headers());

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    fn remember_cookie(&mut self, headers: &axum::http::HeaderMap) {
        let prefix = format!("{SESSION_COOKIE_NAME}=");
        for value in headers.get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            if !value.starts_with(&prefix) {
                continue;
            }
            if value.contains("Max-Age=0") {
                self.cookie = None;
            } else {
                self.cookie = value.split(';').next().map(str::to_owned);
            }
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    /// Register and log in; returns the user's ID.
    pub async fn register(&mut self, email: &str) -> i64 {
        let response = self
            .post(
                "/v1/auth/register",
                json!({ "name": "crio-user", "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["user"]["_id"].as_i64().unwrap()
    }

    /// Register, log in and set a real address; returns the user's ID.
    pub async fn register_with_address(&mut self, email: &str) -> i64 {
        let id = self.register(email).await;
        let response = self
            .put(&format!("/v1/users/{id}"), json!({ "address": ADDRESS }))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        id
    }

    /// `POST /v1/cart`.
    pub async fn add(&mut self, product_id: i32, quantity: i64) -> TestResponse {
        self.post(
            "/v1/cart",
            json!({ "productId": product_id, "quantity": quantity }),
        )
        .await
    }

    /// `PUT /v1/cart`.
    pub async fn update(&mut self, product_id: i32, quantity: i64) -> TestResponse {
        self.put(
            "/v1/cart",
            json!({ "productId": product_id, "quantity": quantity }),
        )
        .await
    }

    /// `PUT /v1/cart/checkout`.
    pub async fn checkout(&mut self) -> TestResponse {
        self.request(Method::PUT, "/v1/cart/checkout", None).await
    }

    /// Wallet balance as reported by `GET /v1/users/{id}`.
    pub async fn wallet(&mut self, user_id: i64) -> Money {
        let response = self.get(&format!("/v1/users/{user_id}")).await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        serde_json::from_value(response.body["walletMoney"].clone()).unwrap()
    }
}
