//! Kaimono Storefront library.
//!
//! Client-side collaborators of the cart: configuration, the ProductAPI
//! client, the shopper's session, catalog filtering and checkout, tied
//! together by [`AppState`].
//!
//! # Modules
//!
//! - [`config`] - Environment-based configuration
//! - [`api`] - Typed, caching ProductAPI client
//! - [`auth`] - Persisted bearer-token session
//! - [`catalog`] - Client-side product filtering
//! - [`checkout`] - Turning the cart into an order
//! - [`state`] - Application state owning all of the above

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod state;

pub use api::ApiClient;
pub use auth::AuthSession;
pub use catalog::ProductFilter;
pub use checkout::{ShippingInfo, place_order};
pub use config::{ConfigError, StorefrontConfig};
pub use error::{ApiError, Result};
pub use state::AppState;
