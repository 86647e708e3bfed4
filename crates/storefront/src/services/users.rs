//! User profile service.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use qkart_core::validation::validate_address;
use qkart_core::{UserId, ValidationError};

use crate::config::AccountDefaults;
use crate::db::{RepositoryError, UserStore};
use crate::models::session::CurrentUser;
use crate::models::user::User;

/// Errors returned by [`UserService`].
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("User not authorized to access this resource")]
    Forbidden,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Reads and updates user profiles on behalf of the logged-in user.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    defaults: AccountDefaults,
}

impl UserService {
    /// Create a user service.
    #[must_use]
    pub const fn new(users: Arc<dyn UserStore>, defaults: AccountDefaults) -> Self {
        Self { users, defaults }
    }

    /// Load the full record of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` if the account no longer exists.
    pub async fn current(&self, requester: &CurrentUser) -> Result<User, UserError> {
        self.users
            .find_by_id(requester.id)
            .await?
            .ok_or(UserError::NotFound)
    }

    /// Fetch a user. Users may only read their own record.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` for an unknown ID and
    /// `UserError::Forbidden` if the record belongs to someone else.
    #[instrument(skip(self, requester), fields(requester = %requester.id))]
    pub async fn get_user(&self, requester: &CurrentUser, user_id: UserId) -> Result<User, UserError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)?;

        if user.email != requester.email {
            return Err(UserError::Forbidden);
        }

        Ok(user)
    }

    /// Replace a user's shipping address and return the stored value.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Validation` if the address is too short or equals
    /// the unset sentinel, plus the errors of [`Self::get_user`].
    #[instrument(skip(self, requester, address), fields(requester = %requester.id))]
    pub async fn set_address(
        &self,
        requester: &CurrentUser,
        user_id: UserId,
        address: &str,
    ) -> Result<String, UserError> {
        let address = validate_address(address, &self.defaults.address)?;

        let mut user = self.get_user(requester, user_id).await?;
        user.address = address;
        self.users.save(&user).await?;

        Ok(user.address)
    }
}
