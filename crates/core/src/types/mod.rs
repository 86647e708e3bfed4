//! Core types for QKart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod money;
pub mod payment;
pub mod product;
pub mod quantity;

pub use cart::{Cart, CartItem, CartItemError};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use payment::PaymentOption;
pub use product::Product;
pub use quantity::{Quantity, QuantityChange, QuantityError};
