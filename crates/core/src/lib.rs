//! QKart Core - Shared domain types library.
//!
//! This crate provides the types used across all QKart components:
//! - `storefront` - JSON API for carts, users and the product catalog
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. Cart invariants (one line item per product, positive
//! quantities, checked totals) live here so every storage backend and every
//! transport shares the same rules.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, money, quantities, and the
//!   product/cart data model
//! - [`validation`] - Input validation run before any service call

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::ValidationError;
