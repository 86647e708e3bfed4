//! The shopping cart and its line item invariants.
//!
//! A [`Cart`] belongs to exactly one user, identified by email. It holds an
//! ordered list of [`CartItem`]s in insertion order, and a product appears in
//! at most one line item. Quantities are [`Quantity`] values, so a line item
//! with quantity zero cannot exist: setting a quantity to zero is expressed as
//! removing the item.
//!
//! ```
//! use qkart_core::{Cart, CartItemError, Email, Money, Product, ProductId, Quantity};
//!
//! let email = Email::parse("crio@example.com").unwrap();
//! let mut cart = Cart::new(email);
//!
//! let product = Product {
//!     id: ProductId::new(1),
//!     name: "Headphones".to_owned(),
//!     category: "Electronics".to_owned(),
//!     rating: 5,
//!     cost: Money::whole(20),
//!     image: String::new(),
//! };
//!
//! cart.add_item(product.clone(), Quantity::new(2).unwrap()).unwrap();
//! assert_eq!(cart.total_cost().unwrap(), Money::whole(40));
//!
//! let err = cart.add_item(product, Quantity::ONE).unwrap_err();
//! assert_eq!(err, CartItemError::AlreadyInCart(ProductId::new(1)));
//! ```

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::ProductId;
use super::money::Money;
use super::payment::PaymentOption;
use super::product::Product;
use super::quantity::Quantity;

/// Errors raised by cart mutations.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartItemError {
    /// The product already has a line item.
    #[error("product {0} is already in the cart")]
    AlreadyInCart(ProductId),
    /// The product has no line item.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
    /// The cart total does not fit in a decimal.
    #[error("cart total overflowed")]
    TotalOverflow,
}

/// A product snapshot and the quantity being bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product as it was when added to the cart.
    pub product: Product,
    /// Number of units.
    pub quantity: Quantity,
}

impl CartItem {
    /// Cost of this line item (unit cost times quantity).
    #[must_use]
    pub fn line_total(&self) -> Option<Money> {
        self.product.cost.times(self.quantity)
    }
}

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    email: Email,
    cart_items: Vec<CartItem>,
    payment_option: PaymentOption,
}

impl Cart {
    /// Create an empty cart for `email`.
    #[must_use]
    pub fn new(email: Email) -> Self {
        Self {
            email,
            cart_items: Vec::new(),
            payment_option: PaymentOption::default(),
        }
    }

    /// Rebuild a cart from stored parts.
    ///
    /// # Errors
    ///
    /// Returns `CartItemError::AlreadyInCart` if two items share a product.
    pub fn from_parts(
        email: Email,
        items: Vec<CartItem>,
        payment_option: PaymentOption,
    ) -> Result<Self, CartItemError> {
        let mut cart = Self {
            email,
            cart_items: Vec::with_capacity(items.len()),
            payment_option,
        };
        for item in items {
            cart.add_item(item.product, item.quantity)?;
        }
        Ok(cart)
    }

    /// Owner's email.
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.cart_items
    }

    /// Payment option.
    #[must_use]
    pub const fn payment_option(&self) -> PaymentOption {
        self.payment_option
    }

    /// Line item for `product_id`, if present.
    #[must_use]
    pub fn item(&self, product_id: ProductId) -> Option<&CartItem> {
        self.cart_items.iter().find(|i| i.product.id == product_id)
    }

    /// Returns `true` if `product_id` has a line item.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.item(product_id).is_some()
    }

    /// Returns `true` if the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart_items.is_empty()
    }

    /// Number of line items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cart_items.len()
    }

    /// Append a line item.
    ///
    /// # Errors
    ///
    /// Returns `CartItemError::AlreadyInCart` if the product has a line item;
    /// the cart is left unchanged.
    pub fn add_item(&mut self, product: Product, quantity: Quantity) -> Result<(), CartItemError> {
        if self.contains(product.id) {
            return Err(CartItemError::AlreadyInCart(product.id));
        }
        self.cart_items.push(CartItem { product, quantity });
        Ok(())
    }

    /// Replace the quantity of an existing line item.
    ///
    /// # Errors
    ///
    /// Returns `CartItemError::NotInCart` if the product has no line item.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), CartItemError> {
        let item = self
            .cart_items
            .iter_mut()
            .find(|i| i.product.id == product_id)
            .ok_or(CartItemError::NotInCart(product_id))?;
        item.quantity = quantity;
        Ok(())
    }

    /// Remove the line item for `product_id` and return it.
    ///
    /// # Errors
    ///
    /// Returns `CartItemError::NotInCart` if the product has no line item.
    pub fn remove_item(&mut self, product_id: ProductId) -> Result<CartItem, CartItemError> {
        let index = self
            .cart_items
            .iter()
            .position(|i| i.product.id == product_id)
            .ok_or(CartItemError::NotInCart(product_id))?;
        Ok(self.cart_items.remove(index))
    }

    /// Sum of cost times quantity over all line items.
    ///
    /// # Errors
    ///
    /// Returns `CartItemError::TotalOverflow` if the sum does not fit.
    pub fn total_cost(&self) -> Result<Money, CartItemError> {
        self.cart_items.iter().try_fold(Money::ZERO, |total, item| {
            item.line_total()
                .and_then(|line| total.checked_add(line))
                .ok_or(CartItemError::TotalOverflow)
        })
    }

    /// Remove every line item. The cart itself remains.
    pub fn clear(&mut self) {
        self.cart_items.clear();
    }
}
