//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (database ping)
//!
//! # Auth
//! POST /v1/auth/register       - Create an account and log in
//! POST /v1/auth/login          - Log in
//! POST /v1/auth/logout         - Log out
//!
//! # Users (requires auth, own record only)
//! GET  /v1/users/{userId}      - Profile, or `{address}` with `?q=address`
//! PUT  /v1/users/{userId}      - Set shipping address
//!
//! # Products
//! GET  /v1/products            - Catalog listing
//! GET  /v1/products/{productId} - Product detail
//!
//! # Cart (requires auth)
//! GET  /v1/cart                - Current cart
//! POST /v1/cart                - Add a product
//! PUT  /v1/cart                - Change quantity (0 removes)
//! PUT  /v1/cart/checkout       - Pay with wallet and empty the cart
//! ```

pub mod auth;
pub mod cart;
pub mod health;
pub mod products;
pub mod users;

use axum::{
    Router,
    extract::{FromRequest, rejection::JsonRejection},
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// JSON body extractor whose rejections use the API error format.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/{user_id}", get(users::show).put(users::update_address))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{product_id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(cart::show).post(cart::add).put(cart::update),
        )
        .route("/checkout", put(cart::checkout))
}

/// Health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// Create all routes without rate limiting.
///
/// Tests drive this router directly; rate limiting keys on the client
/// address, which in-process requests do not have.
pub fn routes() -> Router<AppState> {
    api_routes(auth_routes())
}

/// Create all routes, with the auth endpoints rate limited per client IP.
pub fn rate_limited_routes() -> Router<AppState> {
    api_routes(auth_routes().layer(auth_rate_limiter()))
}

fn api_routes(auth: Router<AppState>) -> Router<AppState> {
    let v1 = Router::new()
        .nest("/auth", auth)
        .nest("/users", user_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes());

    Router::new().merge(health_routes()).nest("/v1", v1)
}
