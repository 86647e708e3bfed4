//! Domain models for the storefront.
//!
//! Cart and product types live in `qkart-core`; this module holds the account
//! types that only the storefront needs.

pub mod session;
pub mod user;

pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, User};
