//! Storage for products, carts and users.
//!
//! # Database: `qkart`
//!
//! ## Tables
//!
//! - `storefront.product` - The product catalog
//! - `storefront.user` - Accounts, wallet balance and shipping address
//! - `storefront.cart` - One cart per user email; line items are stored as a
//!   JSONB document of embedded product snapshots
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p qkart-cli -- migrate
//! ```
//!
//! # Seams
//!
//! Services only see the [`ProductCatalog`], [`CartStore`] and [`UserStore`]
//! traits. The `PostgreSQL` repositories back them in production; the
//! [`memory`] stores back them in tests and local demos.

pub mod cache;
pub mod carts;
pub mod memory;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use qkart_core::{Cart, Email, Product, ProductId, UserId};

use crate::models::user::{NewUser, User};

pub use cache::CachedCatalog;
pub use carts::CartRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}

/// Read access to the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Look up a product by ID.
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// List every product, ordered by ID.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;
}

/// Persistence for carts, keyed by owner email.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Find the cart belonging to `email`.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Cart>, RepositoryError>;

    /// Create an empty cart for `email`.
    ///
    /// Returns `RepositoryError::Conflict` if the user already has one.
    async fn create(&self, email: &Email) -> Result<Cart, RepositoryError>;

    /// Persist the line items and payment option of an existing cart.
    ///
    /// Returns `RepositoryError::NotFound` if the cart does not exist.
    async fn save(&self, cart: &Cart) -> Result<(), RepositoryError>;
}

/// Persistence for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by ID.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Find a user by email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Find a user and their password hash by email.
    async fn find_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Create a user.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Persist the mutable fields of an existing user (wallet and address).
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    async fn save(&self, user: &User) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
