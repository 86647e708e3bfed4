//! Payment options attached to a cart.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a cart will be paid for.
///
/// Only the wallet-backed default exists today; the field is carried on every
/// cart so clients can rely on its presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentOption {
    /// Pay from the user's wallet balance.
    #[default]
    #[serde(rename = "PAYMENT_OPTION_DEFAULT")]
    Default,
}

impl PaymentOption {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "PAYMENT_OPTION_DEFAULT",
        }
    }
}

impl fmt::Display for PaymentOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown payment option.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown payment option: {0}")]
pub struct UnknownPaymentOption(pub String);

impl FromStr for PaymentOption {
    type Err = UnknownPaymentOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAYMENT_OPTION_DEFAULT" => Ok(Self::Default),
            other => Err(UnknownPaymentOption(other.to_owned())),
        }
    }
}
