//! Cart repository.
//!
//! Line items are stored as a JSONB array of `{product, quantity}` documents,
//! so each line item keeps the product snapshot taken when it was added.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use qkart_core::{Cart, CartItem, Email, PaymentOption};

use super::{CartStore, RepositoryError, conflict_on_unique};

#[derive(sqlx::FromRow)]
struct CartRow {
    email: String,
    cart_items: Json<Vec<CartItem>>,
    payment_option: String,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(r: CartRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let payment_option = r
            .payment_option
            .parse::<PaymentOption>()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Self::from_parts(email, r.cart_items.0, payment_option).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid cart for {}: {e}", r.email))
        })
    }
}

/// `PostgreSQL` repository for carts.
#[derive(Clone)]
pub struct CartRepository {
    pool: PgPool,
}

impl CartRepository {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for CartRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT email, cart_items, payment_option
            FROM storefront.cart
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Cart::try_from).transpose()
    }

    async fn create(&self, email: &Email) -> Result<Cart, RepositoryError> {
        let cart = Cart::new(email.clone());

        sqlx::query(
            r"
            INSERT INTO storefront.cart (email, cart_items, payment_option)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(email)
        .bind(Json(cart.items()))
        .bind(cart.payment_option().as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "cart"))?;

        Ok(cart)
    }

    async fn save(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.cart
            SET cart_items = $1, payment_option = $2, updated_at = NOW()
            WHERE email = $3
            ",
        )
        .bind(Json(cart.items()))
        .bind(cart.payment_option().as_str())
        .bind(cart.email())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
