//! Product catalog repository.

use async_trait::async_trait;
use sqlx::PgPool;

use qkart_core::{Money, Product, ProductId};

use super::{ProductCatalog, RepositoryError};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    category: String,
    rating: i16,
    cost: Money,
    image: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(r.rating)
            .ok()
            .filter(|rating| *rating <= Self::MAX_RATING)
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "invalid rating for product {}: {}",
                    r.id, r.rating
                ))
            })?;

        Ok(Self {
            id: r.id,
            name: r.name,
            category: r.category,
            rating,
            cost: r.cost,
            image: r.image,
        })
    }
}

/// A catalog entry about to be inserted.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub rating: u8,
    pub cost: Money,
    pub image: String,
}

/// `PostgreSQL` repository for the product catalog.
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO storefront.product (name, category, rating, cost, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, category, rating, cost, image
            ",
        )
        .bind(&product.name)
        .bind(&product.category)
        .bind(i16::from(product.rating))
        .bind(product.cost)
        .bind(&product.image)
        .fetch_one(&self.pool)
        .await?;

        Product::try_from(row)
    }
}

#[async_trait]
impl ProductCatalog for ProductRepository {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, category, rating, cost, image
            FROM storefront.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, category, rating, cost, image
            FROM storefront.product
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }
}
