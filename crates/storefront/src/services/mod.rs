//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `cart` - Cart operations and checkout
//! - `users` - Profile reads and address updates

pub mod auth;
pub mod cart;
pub mod users;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService, ErrorKind};
pub use users::{UserError, UserService};
