//! Kaimono Core - Shared domain types.
//!
//! This crate provides common types used across all Kaimono components:
//! - `cart` - Locally persisted shopping cart
//! - `storefront` - REST client, session and checkout flow
//! - `cli` - Terminal storefront
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
