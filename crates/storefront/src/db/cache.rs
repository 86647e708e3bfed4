//! Read-through cache in front of a product catalog.
//!
//! Products are looked up on every add and update, so single-product lookups
//! are cached. Cart line items copy the product when added, which bounds a
//! stale entry to a snapshot at most one TTL old. Listings are not cached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use qkart_core::{Product, ProductId};

use super::{ProductCatalog, RepositoryError};

/// Maximum number of cached products.
const MAX_CACHED_PRODUCTS: u64 = 1000;

/// A [`ProductCatalog`] that caches `find_by_id` hits.
pub struct CachedCatalog {
    inner: Arc<dyn ProductCatalog>,
    cache: Cache<ProductId, Product>,
}

impl CachedCatalog {
    /// Wrap `inner` with a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(inner: Arc<dyn ProductCatalog>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CACHED_PRODUCTS)
            .time_to_live(ttl)
            .build();

        Self { inner, cache }
    }
}

#[async_trait]
impl ProductCatalog for CachedCatalog {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        if let Some(product) = self.cache.get(&id).await {
            debug!(product_id = %id, "Cache hit for product");
            return Ok(Some(product));
        }

        let product = self.inner.find_by_id(id).await?;
        if let Some(product) = &product {
            self.cache.insert(id, product.clone()).await;
        }
        Ok(product)
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        self.inner.list().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use qkart_core::Money;

    use super::*;
    use crate::db::memory::MemoryCatalog;

    fn product(cost: u32) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Headphones".to_owned(),
            category: "Electronics".to_owned(),
            rating: 4,
            cost: Money::whole(cost),
            image: String::new(),
        }
    }

    #[tokio::test]
    async fn test_serves_cached_product_until_expired() {
        let backing = Arc::new(MemoryCatalog::with_products([product(20)]));
        let cached = CachedCatalog::new(backing.clone(), Duration::from_millis(50));

        let first = cached.find_by_id(ProductId::new(1)).await.unwrap().unwrap();
        assert_eq!(first.cost, Money::whole(20));

        backing.upsert(product(25)).await;
        let stale = cached.find_by_id(ProductId::new(1)).await.unwrap().unwrap();
        assert_eq!(stale.cost, Money::whole(20));

        tokio::time::sleep(Duration::from_millis(150)).await;
        let fresh = cached.find_by_id(ProductId::new(1)).await.unwrap().unwrap();
        assert_eq!(fresh.cost, Money::whole(25));
    }

    #[tokio::test]
    async fn test_missing_product_is_not_cached() {
        let backing = Arc::new(MemoryCatalog::new());
        let cached = CachedCatalog::new(backing.clone(), Duration::from_secs(60));

        assert!(cached.find_by_id(ProductId::new(1)).await.unwrap().is_none());

        backing.upsert(product(20)).await;
        assert!(cached.find_by_id(ProductId::new(1)).await.unwrap().is_some());
    }
}
