//! User account management.
//!
//! ```bash
//! qkart users set-wallet crio-user@gmail.com 5000
//! ```

use qkart_core::{Email, Money};
use qkart_storefront::db::{RepositoryError, UserRepository};

use super::{CommandError, connect};

/// Overwrite a user's wallet balance.
///
/// # Errors
///
/// Returns `CommandError::UnknownUser` if no account has this email.
pub async fn set_wallet(email: &Email, amount: Money) -> Result<(), CommandError> {
    let pool = connect().await?;
    let users = UserRepository::new(pool);

    users
        .set_wallet(email, amount)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CommandError::UnknownUser(email.to_string()),
            other => CommandError::Repository(other),
        })?;

    tracing::info!(%email, %amount, "Wallet updated");
    Ok(())
}
