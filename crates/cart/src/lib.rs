//! Kaimono Cart - the shopping cart state manager.
//!
//! The cart is an ordered list of line items kept in memory and mirrored to a
//! durable key-value slot after every mutation. Each line item carries a
//! snapshot of the product taken when it was first added, so the cart can be
//! rendered and totalled without talking to the ProductAPI.
//!
//! # Example
//!
//! ```rust
//! use kaimono_cart::{CartStore, MemoryStore, ProductSnapshot};
//! use kaimono_core::{Price, ProductId};
//!
//! let storage = MemoryStore::new();
//! let mut cart = CartStore::open(storage.clone());
//!
//! let tee = ProductSnapshot::new(ProductId::new(1), "Linen tee", Price::from(1000));
//! cart.add_item(&tee, 2);
//! cart.add_item(&tee, 3);
//!
//! assert_eq!(cart.total_item_count(), 5);
//! assert_eq!(cart.total_price(), Price::from(5000));
//!
//! // A second store on the same slot sees the flushed state.
//! let reopened = CartStore::open(storage);
//! assert_eq!(reopened.items(), cart.items());
//! ```
//!
//! # Modules
//!
//! - [`item`] - Line items and product snapshots
//! - [`storage`] - Durable key-value slots (`MemoryStore`, `FileStore`)
//! - [`codec`] - Persisted text format
//! - [`store`] - `CartStore` itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod codec;
pub mod item;
pub mod storage;
pub mod store;

pub use item::{CartLineItem, ProductSnapshot};
pub use storage::{CART_STORAGE_KEY, FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{CartEvent, CartStore, SubscriptionId};
