//! Durable key-value slots.
//!
//! A [`KeyValueStore`] is the client's local persistent store: synchronous
//! `get`/`set` of whole text values under short string keys. Every slot is a
//! single mutable cell; writers always overwrite the full value.
//!
//! # Implementations
//!
//! - [`MemoryStore`] - shared in-process map, optionally with a size quota
//! - [`FileStore`] - one file per key under a data directory

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Fixed key of the slot holding the persisted cart.
pub const CART_STORAGE_KEY: &str = "cart";

/// Errors raised by a storage provider.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key contains characters that cannot name a slot.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Value does not fit in the provider's quota.
    #[error("quota exceeded: {needed} bytes needed, {quota} available")]
    QuotaExceeded { needed: usize, quota: usize },

    /// Provider cannot be used at all (disabled, poisoned lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous access to durable key-value slots.
pub trait KeyValueStore {
    /// Read the value stored under `key`, or `None` if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the provider cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the slot under `key` with `value`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Empty the slot under `key`. Removing an empty slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the provider cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Keys name files on disk, so they are limited to `[A-Za-z0-9_-]`.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_owned()))
    }
}
