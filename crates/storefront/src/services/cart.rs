//! Cart service.
//!
//! The only code allowed to mutate a cart or debit a wallet. Every operation
//! is a read-modify-write against the stores: look up, mutate in memory via
//! the [`Cart`] invariants, persist. Nothing is wrapped in a transaction, so
//! two concurrent writes to the same cart can race unless per-cart
//! serialization is switched on (`CART_SERIALIZE_WRITES`).
//!
//! Checkout persists the debited user and the emptied cart with two separate
//! calls, user first.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::instrument;

use qkart_core::{Cart, CartItemError, Email, Money, ProductId, Quantity, QuantityChange};

use crate::config::AccountDefaults;
use crate::db::{CartStore, ProductCatalog, RepositoryError, UserStore};
use crate::models::user::User;

/// How long an idle per-cart lock is kept around.
const LOCK_IDLE_TTL: Duration = Duration::from_secs(60);

/// Failure classes for cart operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The cart does not exist.
    NotFound,
    /// The request breaks a cart rule.
    InvalidRequest,
    /// Storage failed unexpectedly.
    InternalError,
}

/// Errors returned by [`CartService`].
///
/// The `Display` text is the message returned to clients.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("User does not have a cart")]
    CartNotFound,

    #[error("Product doesn't exist in database")]
    UnknownProduct(ProductId),

    #[error("Product already in cart. Use the cart sidebar to update or remove product from cart")]
    AlreadyInCart(ProductId),

    #[error("User does not have a cart. Use POST to create cart and add a product")]
    NoCartToUpdate,

    #[error("User does not have a cart")]
    NoCartToDelete,

    #[error("Product not in cart")]
    NotInCart(ProductId),

    #[error("User does not have any products added in the cart")]
    EmptyCart,

    #[error("Set User address first")]
    AddressNotSet,

    #[error("Insufficient funds in user's wallet")]
    InsufficientFunds {
        /// Cart total.
        required: Money,
        /// Wallet balance.
        available: Money,
    },

    /// Creating the cart failed (usually a concurrent create for the same user).
    #[error("Internal Server Error")]
    CreateFailed(#[source] RepositoryError),

    #[error("cart total overflowed")]
    TotalOverflow,

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl CartError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CartNotFound => ErrorKind::NotFound,
            Self::UnknownProduct(_)
            | Self::AlreadyInCart(_)
            | Self::NoCartToUpdate
            | Self::NoCartToDelete
            | Self::NotInCart(_)
            | Self::EmptyCart
            | Self::AddressNotSet
            | Self::InsufficientFunds { .. } => ErrorKind::InvalidRequest,
            Self::CreateFailed(_) | Self::TotalOverflow | Self::Storage(_) => {
                ErrorKind::InternalError
            }
        }
    }
}

impl From<CartItemError> for CartError {
    fn from(err: CartItemError) -> Self {
        match err {
            CartItemError::AlreadyInCart(id) => Self::AlreadyInCart(id),
            CartItemError::NotInCart(id) => Self::NotInCart(id),
            CartItemError::TotalOverflow => Self::TotalOverflow,
        }
    }
}

/// Per-user async locks serializing cart writes.
#[derive(Clone)]
struct CartLocks {
    locks: Cache<Email, Arc<Mutex<()>>>,
}

impl CartLocks {
    fn new() -> Self {
        Self {
            locks: Cache::builder().time_to_idle(LOCK_IDLE_TTL).build(),
        }
    }

    async fn acquire(&self, email: &Email) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .get_with(email.clone(), async { Arc::new(Mutex::new(())) })
            .await;
        lock.lock_owned().await
    }
}

/// Cart operations.
#[derive(Clone)]
pub struct CartService {
    catalog: Arc<dyn ProductCatalog>,
    carts: Arc<dyn CartStore>,
    users: Arc<dyn UserStore>,
    defaults: AccountDefaults,
    locks: Option<CartLocks>,
}

impl CartService {
    /// Create a cart service.
    #[must_use]
    pub const fn new(
        catalog: Arc<dyn ProductCatalog>,
        carts: Arc<dyn CartStore>,
        users: Arc<dyn UserStore>,
        defaults: AccountDefaults,
    ) -> Self {
        Self {
            catalog,
            carts,
            users,
            defaults,
            locks: None,
        }
    }

    /// Serialize writes to the same cart.
    #[must_use]
    pub fn with_serialized_writes(mut self, enabled: bool) -> Self {
        self.locks = enabled.then(CartLocks::new);
        self
    }

    async fn lock(&self, email: &Email) -> Option<OwnedMutexGuard<()>> {
        match &self.locks {
            Some(locks) => Some(locks.acquire(email).await),
            None => None,
        }
    }

    /// Fetch the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the user has no cart.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn get_cart_by_user(&self, email: &Email) -> Result<Cart, CartError> {
        self.carts
            .find_by_email(email)
            .await?
            .ok_or(CartError::CartNotFound)
    }

    /// Add a product to the user's cart, creating the cart on first use.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownProduct` if the product is not in the
    /// catalog, `CartError::AlreadyInCart` if it already has a line item and
    /// `CartError::CreateFailed` if the cart could not be created.
    #[instrument(skip(self), fields(email = %email, product_id = %product_id, quantity = %quantity))]
    pub async fn add_product_to_cart(
        &self,
        email: &Email,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Cart, CartError> {
        let product = self
            .catalog
            .find_by_id(product_id)
            .await?
            .ok_or(CartError::UnknownProduct(product_id))?;

        let _guard = self.lock(email).await;

        let mut cart = match self.carts.find_by_email(email).await? {
            Some(cart) => cart,
            None => {
                tracing::info!("Creating cart");
                self.carts
                    .create(email)
                    .await
                    .map_err(CartError::CreateFailed)?
            }
        };

        cart.add_item(product, quantity)?;
        self.carts.save(&cart).await?;

        Ok(cart)
    }

    /// Set the quantity of a product already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownProduct` if the product is not in the
    /// catalog, `CartError::NoCartToUpdate` if the user has no cart and
    /// `CartError::NotInCart` if the product has no line item.
    #[instrument(skip(self), fields(email = %email, product_id = %product_id, quantity = %quantity))]
    pub async fn update_product_in_cart(
        &self,
        email: &Email,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Cart, CartError> {
        if self.catalog.find_by_id(product_id).await?.is_none() {
            return Err(CartError::UnknownProduct(product_id));
        }

        let _guard = self.lock(email).await;

        let mut cart = self
            .carts
            .find_by_email(email)
            .await?
            .ok_or(CartError::NoCartToUpdate)?;

        cart.set_quantity(product_id, quantity)?;
        self.carts.save(&cart).await?;

        Ok(cart)
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoCartToDelete` if the user has no cart and
    /// `CartError::NotInCart` if the product has no line item.
    #[instrument(skip(self), fields(email = %email, product_id = %product_id))]
    pub async fn delete_product_from_cart(
        &self,
        email: &Email,
        product_id: ProductId,
    ) -> Result<Cart, CartError> {
        let _guard = self.lock(email).await;

        let mut cart = self
            .carts
            .find_by_email(email)
            .await?
            .ok_or(CartError::NoCartToDelete)?;

        cart.remove_item(product_id)?;
        self.carts.save(&cart).await?;

        Ok(cart)
    }

    /// Apply an update request: a positive quantity updates the line item,
    /// zero removes it.
    ///
    /// Returns the updated cart for `Set` and `None` for `Remove`.
    ///
    /// # Errors
    ///
    /// See [`Self::update_product_in_cart`] and
    /// [`Self::delete_product_from_cart`].
    pub async fn apply_quantity_change(
        &self,
        email: &Email,
        product_id: ProductId,
        change: QuantityChange,
    ) -> Result<Option<Cart>, CartError> {
        match change {
            QuantityChange::Set(quantity) => self
                .update_product_in_cart(email, product_id, quantity)
                .await
                .map(Some),
            QuantityChange::Remove => self
                .delete_product_from_cart(email, product_id)
                .await
                .map(|_| None),
        }
    }

    /// Check out the user's cart: debit the wallet by the cart total and
    /// empty the cart.
    ///
    /// Checks run in order and stop at the first failure: the cart exists,
    /// it has items, the address is set, the wallet covers the total.
    ///
    /// With serialized writes the user is reloaded once the lock is held, so
    /// the debit applies to the balance left by any checkout that ran first.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound`, `CartError::EmptyCart`,
    /// `CartError::AddressNotSet` or `CartError::InsufficientFunds`.
    #[instrument(skip(self, user), fields(user_id = %user.id, email = %user.email))]
    pub async fn checkout(&self, user: &mut User) -> Result<(), CartError> {
        let guard = self.lock(&user.email).await;
        if guard.is_some()
            && let Some(current) = self.users.find_by_id(user.id).await?
        {
            *user = current;
        }

        let mut cart = self.get_cart_by_user(&user.email).await?;

        if cart.is_empty() {
            return Err(CartError::EmptyCart);
        }

        if !user.has_set_non_default_address(&self.defaults) {
            return Err(CartError::AddressNotSet);
        }

        let total = cart.total_cost()?;
        let remaining = user.wallet_money.checked_sub(total).ok_or(
            CartError::InsufficientFunds {
                required: total,
                available: user.wallet_money,
            },
        )?;

        let mut debited = user.clone();
        debited.wallet_money = remaining;
        self.users.save(&debited).await?;
        *user = debited;

        cart.clear();
        if let Err(e) = self.carts.save(&cart).await {
            tracing::error!(
                error = %e,
                total = %total,
                "Wallet debited but cart could not be cleared"
            );
            return Err(e.into());
        }

        tracing::info!(total = %total, remaining = %remaining, "Checkout complete");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use qkart_core::Product;

    use super::*;
    use crate::db::memory::{MemoryCartStore, MemoryCatalog, MemoryUserStore};
    use crate::models::user::NewUser;

    const ADDRESS: &str = "221B Baker Street, London";

    struct Fixture {
        service: CartService,
        catalog: Arc<MemoryCatalog>,
        users: Arc<MemoryUserStore>,
        carts: Arc<MemoryCartStore>,
    }

    fn product(id: i32, cost: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            category: "Sports".to_owned(),
            rating: 5,
            cost: Money::whole(cost),
            image: String::new(),
        }
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(MemoryCatalog::with_products([
            product(1, 20),
            product(2, 5),
            product(3, 100),
        ]));
        let carts = Arc::new(MemoryCartStore::new());
        let users = Arc::new(MemoryUserStore::new());
        let service = CartService::new(
            catalog.clone(),
            carts.clone(),
            users.clone(),
            AccountDefaults::default(),
        );
        Fixture {
            service,
            catalog,
            users,
            carts,
        }
    }

    async fn user(fx: &Fixture, address: &str) -> User {
        fx.users
            .create(NewUser {
                name: "crio-user".to_owned(),
                email: Email::parse("crio-user@gmail.com").unwrap(),
                password_hash: "hash".to_owned(),
                wallet_money: Money::whole(500),
                address: address.to_owned(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_cart_without_cart_is_not_found() {
        let fx = fixture();
        let user = user(&fx, ADDRESS).await;

        let err = fx.service.get_cart_by_user(&user.email).await.unwrap_err();
        assert!(matches!(err, CartError::CartNotFound));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "User does not have a cart");
    }

    #[tokio::test]
    async fn test_add_creates_cart_lazily() {
        let fx = fixture();
        let user = user(&fx, ADDRESS).await;

        let cart = fx
            .service
            .add_product_to_cart(&user.email, ProductId::new(1), qty(2))
            .await
            .unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.email(), &user.email);

        let stored = fx.service.get_cart_by_user(&user.email).await.unwrap();
        assert_eq!(stored, cart);
    }

    #[tokio::test]
    async fn test_add_unknown_product() {
        let fx = fixture();
        let user = user(&fx, ADDRESS).await;

        let err = fx
            .service
            .add_product_to_cart(&user.email, ProductId::new(99), qty(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::UnknownProduct(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(fx.carts.find_by_email(&user.email).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_duplicate_leaves_cart_unchanged() {
        let fx = fixture();
        let user = user(&fx, ADDRESS).await;
        fx.service
            .add_product_to_cart(&user.email, ProductId::new(1), qty(2))
            .await
            .unwrap();
        let before = fx.service.get_cart_by_user(&user.email).await.unwrap();

        let err = fx
            .service
            .add_product_to_cart(&user.email, ProductId::new(1), qty(7))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::AlreadyInCart(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let after = fx.service.get_cart_by_user(&user.email).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_update_requires_cart() {
        let fx = fixture();
        let user = user(&fx, ADDRESS).await;

        let err = fx
            .service
            .update_product_in_cart(&user.email, ProductId::new(1), qty(3))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::NoCartToUpdate));
        assert_eq!(
            err.to_string(),
            "User does not have a cart. Use POST to create cart and add a product"
        );
    }

    #[tokio::test]
    async fn test_update_product_not_in_cart() {
        let fx = fixture();
        let user = user(&fx, ADDRESS).await;
        fx.service
            .add_product_to_cart(&user.email, ProductId::new(1), qty(2))
            .await
            .unwrap();
        let before = fx.service.get_cart_by_user(&user.email).await.unwrap();

        let err = fx
            .service
            .update_product_in_cart(&user.email, ProductId::new(2), qty(3))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::NotInCart(_)));

        let after = fx.service.get_cart_by_user(&user.email).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_update_sets_quantity() {
        let fx = fixture();
        let user = user(&fx, ADDRESS).await;
        fx.service
            .add_product_to_cart(&user.email, ProductId::new(1), qty(2))
            .await
            .unwrap();

        let cart = fx
            .service
            .update_product_in_cart(&user.email, ProductId::new(1), qty(5))
            .await
            .unwrap();
        assert_eq!(cart.item(ProductId::new(1)).unwrap().quantity, qty(5));
    }

    #[tokio::test]
    async fn test_delete_removes_only_match() {
        let fx = fixture();
        let user = user(&fx, ADDRESS).await;
        for (id, n) in [(1, 1), (2, 2), (3, 3)] {
            fx.service
                .add_product_to_cart(&user.email, ProductId::new(id), qty(n))
                .await
                .unwrap();
        }

        let cart = fx
            .service
            .delete_product_from_cart(&user.email, ProductId::new(2))
            .await
            .unwrap();
        let remaining: Vec<(i32, u32)> = cart
            .items()
            .iter()
            .map(|i| (i.product.id.as_i32(), i.quantity.get()))
            .collect();
        assert_eq!(remaining, vec![(1, 1), (3, 3)]);

        let err = fx
            .service
            .delete_product_from_cart(&user.email, ProductId::new(2))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::NotInCart(_)));
        assert_eq!(
            fx.service.get_cart_by_user(&user.email).await.unwrap(),
            cart
        );
    }

    #[tokio::test]
    async fn test_delete_without_cart() {
        let fx = fixture();
        let user = user(&fx, ADDRESS).await;

        let err = fx
            .service
            .delete_product_from_cart(&user.email, ProductId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::NoCartToDelete));
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_apply_quantity_change_zero_removes() {
        let fx = fixture();
        let user = user(&fx, ADDRESS).await;
        fx.service
            .add_product_to_cart(&user.email, ProductId::new(1), qty(2))
            .await
            .unwrap();

        let result = fx
            .service
            .apply_quantity_change(&user.email, ProductId::new(1), QuantityChange::Remove)
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(
            fx.service
                .get_cart_by_user(&user.email)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_checkout_debits_wallet_and_empties_cart() {
        let fx = fixture();
        let mut user = user(&fx, ADDRESS).await;
        fx.service
            .add_product_to_cart(&user.email, ProductId::new(1), qty(2))
            .await
            .unwrap();

        fx.service.checkout(&mut user).await.unwrap();

        assert_eq!(user.wallet_money, Money::whole(460));
        let stored = fx.users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.wallet_money, Money::whole(460));

        let cart = fx.service.get_cart_by_user(&user.email).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_without_cart() {
        let fx = fixture();
        let mut user = user(&fx, ADDRESS).await;

        let err = fx.service.checkout(&mut user).await.unwrap_err();
        assert!(matches!(err, CartError::CartNotFound));
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_keeps_wallet() {
        let fx = fixture();
        let mut user = user(&fx, ADDRESS).await;
        fx.service
            .add_product_to_cart(&user.email, ProductId::new(1), qty(1))
            .await
            .unwrap();
        fx.service
            .delete_product_from_cart(&user.email, ProductId::new(1))
            .await
            .unwrap();

        let err = fx.service.checkout(&mut user).await.unwrap_err();
        assert!(matches!(err, CartError::EmptyCart));
        assert_eq!(user.wallet_money, Money::whole(500));
        let stored = fx.users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.wallet_money, Money::whole(500));
    }

    #[tokio::test]
    async fn test_checkout_default_address_checked_before_funds() {
        let fx = fixture();
        let mut user = user(&fx, "ADDRESS_NOT_SET").await;
        fx.service
            .add_product_to_cart(&user.email, ProductId::new(2), qty(1))
            .await
            .unwrap();

        let err = fx.service.checkout(&mut user).await.unwrap_err();
        assert!(matches!(err, CartError::AddressNotSet));
        assert_eq!(err.to_string(), "Set User address first");
        assert_eq!(user.wallet_money, Money::whole(500));
    }

    #[tokio::test]
    async fn test_checkout_insufficient_funds() {
        let fx = fixture();
        let mut user = user(&fx, ADDRESS).await;
        fx.service
            .add_product_to_cart(&user.email, ProductId::new(3), qty(6))
            .await
            .unwrap();

        let err = fx.service.checkout(&mut user).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::InsufficientFunds { required, available }
                if required == Money::whole(600) && available == Money::whole(500)
        ));
        assert_eq!(err.to_string(), "Insufficient funds in user's wallet");

        let cart = fx.service.get_cart_by_user(&user.email).await.unwrap();
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_get_cart_is_idempotent() {
        let fx = fixture();
        let user = user(&fx, ADDRESS).await;
        fx.service
            .add_product_to_cart(&user.email, ProductId::new(1), qty(2))
            .await
            .unwrap();

        let first = fx.service.get_cart_by_user(&user.email).await.unwrap();
        let second = fx.service.get_cart_by_user(&user.email).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_serialized_checkout_debits_current_balance() {
        let fx = fixture();
        let service = fx.service.clone().with_serialized_writes(true);
        let mut user = user(&fx, ADDRESS).await;
        let mut stale = user.clone();

        service
            .add_product_to_cart(&user.email, ProductId::new(1), qty(2))
            .await
            .unwrap();
        service.checkout(&mut user).await.unwrap();
        assert_eq!(user.wallet_money, Money::whole(460));

        service
            .add_product_to_cart(&user.email, ProductId::new(2), qty(1))
            .await
            .unwrap();
        service.checkout(&mut stale).await.unwrap();

        assert_eq!(stale.wallet_money, Money::whole(455));
        let stored = fx.users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.wallet_money, Money::whole(455));
    }

    #[tokio::test]
    async fn test_cart_keeps_price_at_time_of_adding() {
        let fx = fixture();
        let mut user = user(&fx, ADDRESS).await;
        fx.service
            .add_product_to_cart(&user.email, ProductId::new(1), qty(2))
            .await
            .unwrap();

        fx.catalog.upsert(product(1, 200)).await;

        let cart = fx.service.get_cart_by_user(&user.email).await.unwrap();
        assert_eq!(
            cart.item(ProductId::new(1)).unwrap().product.cost,
            Money::whole(20)
        );

        fx.service.checkout(&mut user).await.unwrap();
        assert_eq!(user.wallet_money, Money::whole(460));
    }

    #[tokio::test]
    async fn test_serialized_writes_keep_products_unique() {
        let fx = fixture();
        let service = fx.service.clone().with_serialized_writes(true);
        let user = user(&fx, ADDRESS).await;

        let (a, b) = tokio::join!(
            service.add_product_to_cart(&user.email, ProductId::new(1), qty(1)),
            service.add_product_to_cart(&user.email, ProductId::new(1), qty(1)),
        );
        assert!(a.is_ok() != b.is_ok());

        let cart = service.get_cart_by_user(&user.email).await.unwrap();
        assert_eq!(cart.len(), 1);
    }
}
