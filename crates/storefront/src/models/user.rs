//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use qkart_core::{Email, Money, UserId};

use crate::config::AccountDefaults;

/// A QKart user (domain type).
///
/// The password hash is kept out of this type so it can never be serialized
/// into a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// User's email address (cart key).
    pub email: Email,
    /// Wallet balance, debited at checkout.
    pub wallet_money: Money,
    /// Shipping address, or the default sentinel if never set.
    pub address: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns `true` if the user has replaced the default address.
    #[must_use]
    pub fn has_set_non_default_address(&self, defaults: &AccountDefaults) -> bool {
        !defaults.is_default_address(&self.address)
    }
}

/// A user about to be created.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub wallet_money: Money,
    pub address: String,
}

impl NewUser {
    /// Build a new user with the configured starting wallet and address.
    #[must_use]
    pub fn with_defaults(
        name: String,
        email: Email,
        password_hash: String,
        defaults: &AccountDefaults,
    ) -> Self {
        Self {
            name,
            email,
            password_hash,
            wallet_money: defaults.wallet_money,
            address: defaults.address.clone(),
        }
    }
}
