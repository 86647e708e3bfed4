//! In-memory stores with the same semantics as the `PostgreSQL` repositories.
//!
//! Used by tests and for running the API without a database. Carts and users
//! are unique by email, exactly as the database constraints enforce.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use qkart_core::{Cart, Email, Money, Product, ProductId, UserId};

use super::{CartStore, ProductCatalog, RepositoryError, UserStore};
use crate::models::user::{NewUser, User};

/// In-memory product catalog.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    // Keyed by the raw id so listing comes out in id order.
    products: RwLock<BTreeMap<i32, Product>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding `products`.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products
            .into_iter()
            .map(|p| (p.id.as_i32(), p))
            .collect();
        Self {
            products: RwLock::new(products),
        }
    }

    /// Add or replace a product.
    pub async fn upsert(&self, product: Product) {
        self.products
            .write()
            .await
            .insert(product.id.as_i32(), product);
    }
}

#[async_trait]
impl ProductCatalog for MemoryCatalog {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.read().await.get(&id.as_i32()).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.products.read().await.values().cloned().collect())
    }
}

/// In-memory cart store.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    carts: RwLock<HashMap<Email, Cart>>,
}

impl MemoryCartStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.carts.read().await.get(email).cloned())
    }

    async fn create(&self, email: &Email) -> Result<Cart, RepositoryError> {
        let mut carts = self.carts.write().await;
        if carts.contains_key(email) {
            return Err(RepositoryError::Conflict("cart already exists".to_owned()));
        }
        let cart = Cart::new(email.clone());
        carts.insert(email.clone(), cart.clone());
        Ok(cart)
    }

    async fn save(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let mut carts = self.carts.write().await;
        let stored = carts
            .get_mut(cart.email())
            .ok_or(RepositoryError::NotFound)?;
        *stored = cart.clone();
        Ok(())
    }
}

#[derive(Debug)]
struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Debug, Default)]
struct UserTable {
    next_id: i32,
    by_id: BTreeMap<i32, StoredUser>,
}

/// In-memory user store.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    table: RwLock<UserTable>,
}

impl MemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a user's wallet balance by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this email.
    pub async fn set_wallet(&self, email: &Email, amount: Money) -> Result<(), RepositoryError> {
        let mut table = self.table.write().await;
        let stored = table
            .by_id
            .values_mut()
            .find(|s| &s.user.email == email)
            .ok_or(RepositoryError::NotFound)?;
        stored.user.wallet_money = amount;
        stored.user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.by_id.get(&id.as_i32()).map(|s| s.user.clone()))
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .find_with_password(email)
            .await?
            .map(|(user, _)| user))
    }

    async fn find_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table
            .by_id
            .values()
            .find(|s| &s.user.email == email)
            .map(|s| (s.user.clone(), s.password_hash.clone())))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let mut table = self.table.write().await;
        if table.by_id.values().any(|s| s.user.email == new_user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        table.next_id += 1;
        let id = table.next_id;
        let now = Utc::now();
        let user = User {
            id: UserId::new(id),
            name: new_user.name,
            email: new_user.email,
            wallet_money: new_user.wallet_money,
            address: new_user.address,
            created_at: now,
            updated_at: now,
        };

        table.by_id.insert(
            id,
            StoredUser {
                user: user.clone(),
                password_hash: new_user.password_hash,
            },
        );
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        let mut table = self.table.write().await;
        let stored = table
            .by_id
            .get_mut(&user.id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        stored.user.wallet_money = user.wallet_money;
        stored.user.address.clone_from(&user.address);
        stored.user.updated_at = Utc::now();
        Ok(())
    }
}
