//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{
    CachedCatalog, CartRepository, CartStore, ProductCatalog, ProductRepository, UserRepository,
    UserStore,
};
use crate::services::{AuthService, CartService, UserService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration and the services built over the stores.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    /// `None` when running over in-memory stores.
    pool: Option<PgPool>,
    catalog: Arc<dyn ProductCatalog>,
    cart_service: CartService,
    auth_service: AuthService,
    user_service: UserService,
}

impl AppState {
    /// Create state backed by `PostgreSQL`.
    ///
    /// The catalog is fronted by a [`CachedCatalog`] unless the configured
    /// TTL is zero.
    #[must_use]
    pub fn postgres(config: StorefrontConfig, pool: PgPool) -> Self {
        let products: Arc<dyn ProductCatalog> = Arc::new(ProductRepository::new(pool.clone()));
        let catalog: Arc<dyn ProductCatalog> = if config.catalog_cache_ttl.is_zero() {
            products
        } else {
            Arc::new(CachedCatalog::new(products, config.catalog_cache_ttl))
        };
        let carts = Arc::new(CartRepository::new(pool.clone()));
        let users = Arc::new(UserRepository::new(pool.clone()));

        Self::build(config, Some(pool), catalog, carts, users)
    }

    /// Create state over arbitrary stores (in-memory stores in tests).
    #[must_use]
    pub fn in_memory(
        config: StorefrontConfig,
        catalog: Arc<dyn ProductCatalog>,
        carts: Arc<dyn CartStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self::build(config, None, catalog, carts, users)
    }

    fn build(
        config: StorefrontConfig,
        pool: Option<PgPool>,
        catalog: Arc<dyn ProductCatalog>,
        carts: Arc<dyn CartStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let defaults = config.account.clone();
        let cart_service = CartService::new(
            Arc::clone(&catalog),
            carts,
            Arc::clone(&users),
            defaults.clone(),
        )
        .with_serialized_writes(config.serialize_cart_writes);
        let auth_service = AuthService::new(Arc::clone(&users), defaults.clone());
        let user_service = UserService::new(users, defaults);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                cart_service,
                auth_service,
                user_service,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the database pool, if the state is database-backed.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn ProductCatalog {
        self.inner.catalog.as_ref()
    }

    /// Get the cart service.
    #[must_use]
    pub fn carts(&self) -> &CartService {
        &self.inner.cart_service
    }

    /// Get the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth_service
    }

    /// Get the user service.
    #[must_use]
    pub fn users(&self) -> &UserService {
        &self.inner.user_service
    }

    /// Check that backing storage is reachable.
    ///
    /// In-memory state is always ready.
    ///
    /// # Errors
    ///
    /// Returns the database error if the ping fails.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        if let Some(pool) = self.pool() {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
