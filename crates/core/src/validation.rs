//! Input validation run before any service call.
//!
//! These checks are independent of the data model: handlers run them on raw
//! request fields and only pass validated values on to the services.

use crate::types::{EmailError, QuantityChange, QuantityError};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum length of a shipping address.
pub const MIN_ADDRESS_LENGTH: usize = 20;

/// Validation failures for request input.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ValidationError {
    /// The email is malformed.
    #[error("{0}")]
    Email(#[from] EmailError),

    /// The password is shorter than the minimum.
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum length.
        min: usize,
    },

    /// The password lacks a letter or a digit.
    #[error("password must contain at least 1 letter and 1 number")]
    PasswordMissingLetterOrDigit,

    /// The name is empty.
    #[error("name cannot be empty")]
    EmptyName,

    /// The address is shorter than the minimum.
    #[error("address must be at least {min} characters")]
    AddressTooShort {
        /// Minimum length.
        min: usize,
    },

    /// The address equals the unset sentinel.
    #[error("address cannot be the default address")]
    DefaultAddress,

    /// The quantity is out of range.
    #[error("{0}")]
    Quantity(#[from] QuantityError),
}

/// Check that a password is long enough and mixes letters and digits.
///
/// # Errors
///
/// Returns `ValidationError::PasswordTooShort` or
/// `ValidationError::PasswordMissingLetterOrDigit`.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }

    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(ValidationError::PasswordMissingLetterOrDigit);
    }

    Ok(())
}

/// Trim a display name and require it to be non-empty.
///
/// # Errors
///
/// Returns `ValidationError::EmptyName` if nothing is left after trimming.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name.to_owned())
}

/// Trim a shipping address and check it against the unset sentinel.
///
/// # Errors
///
/// Returns `ValidationError::AddressTooShort` or
/// `ValidationError::DefaultAddress`.
pub fn validate_address(address: &str, default_address: &str) -> Result<String, ValidationError> {
    let address = address.trim();
    if address == default_address {
        return Err(ValidationError::DefaultAddress);
    }
    if address.chars().count() < MIN_ADDRESS_LENGTH {
        return Err(ValidationError::AddressTooShort {
            min: MIN_ADDRESS_LENGTH,
        });
    }
    Ok(address.to_owned())
}

/// Classify the quantity of a cart update request.
///
/// # Errors
///
/// Returns `ValidationError::Quantity` for negative or oversized values.
pub fn parse_quantity(raw: i64) -> Result<QuantityChange, ValidationError> {
    Ok(QuantityChange::from_raw(raw)?)
}
