//! Line item quantities.
//!
//! A cart line item always holds a positive quantity. Requests carry raw
//! integers, which are classified by [`QuantityChange::from_raw`]: a positive
//! value sets the quantity, zero removes the line item, and negative values
//! are rejected.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero is not a valid line item quantity.
    #[error("quantity must be greater than zero")]
    Zero,
    /// The quantity is below zero.
    #[error("quantity cannot be negative (got {0})")]
    Negative(i64),
    /// The quantity does not fit in a line item.
    #[error("quantity must be at most {max} (got {got})")]
    TooLarge {
        /// Largest accepted quantity.
        max: u32,
        /// Rejected input.
        got: i64,
    },
}

/// A positive line item quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A quantity of one.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity from a count.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::Zero` if `count` is zero.
    pub const fn new(count: u32) -> Result<Self, QuantityError> {
        match NonZeroU32::new(count) {
            Some(n) => Ok(Self(n)),
            None => Err(QuantityError::Zero),
        }
    }

    /// Returns the count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(count: u32) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match QuantityChange::from_raw(raw)? {
            QuantityChange::Set(quantity) => Ok(quantity),
            QuantityChange::Remove => Err(QuantityError::Zero),
        }
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an update request asks to happen to a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Set the line item to this quantity.
    Set(Quantity),
    /// Remove the line item from the cart.
    Remove,
}

impl QuantityChange {
    /// Classify a raw quantity from an update request.
    ///
    /// ```
    /// use qkart_core::{Quantity, QuantityChange};
    ///
    /// assert_eq!(QuantityChange::from_raw(0).unwrap(), QuantityChange::Remove);
    /// assert_eq!(
    ///     QuantityChange::from_raw(3).unwrap(),
    ///     QuantityChange::Set(Quantity::new(3).unwrap())
    /// );
    /// assert!(QuantityChange::from_raw(-1).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::Negative` for values below zero and
    /// `QuantityError::TooLarge` for values that do not fit in a `u32`.
    pub fn from_raw(raw: i64) -> Result<Self, QuantityError> {
        if raw < 0 {
            return Err(QuantityError::Negative(raw));
        }
        let count = u32::try_from(raw).map_err(|_| QuantityError::TooLarge {
            max: u32::MAX,
            got: raw,
        })?;
        Ok(Quantity::new(count).map_or(Self::Remove, Self::Set))
    }
}
