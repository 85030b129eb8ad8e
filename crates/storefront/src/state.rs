//! Application state built once at startup.

use std::path::Path;

use kaimono_cart::{CartStore, FileStore, KeyValueStore};
use tracing::debug;

use crate::api::ApiClient;
use crate::auth::AuthSession;
use crate::config::StorefrontConfig;
use crate::error::Result;

/// Everything a storefront front end needs, owned in one place.
///
/// The cart and the session share one [`KeyValueStore`] (distinct slots), so
/// rebuilding the state over the same storage picks both up again. Unlike the
/// [`ApiClient`], the state is not shared: mutations go through `&mut self`.
pub struct AppState<S: KeyValueStore + Clone = FileStore> {
    config: StorefrontConfig,
    api: ApiClient,
    cart: CartStore<S>,
    session: AuthSession<S>,
}

impl AppState<FileStore> {
    /// Create the state with the cart and token stored under
    /// `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self> {
        let storage = FileStore::new(&config.data_dir);
        Self::with_storage(config, storage)
    }

    /// Directory holding the cart and token slots.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        self.cart.storage().root()
    }
}

impl<S: KeyValueStore + Clone> AppState<S> {
    /// Create the state over an explicit storage backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(config: StorefrontConfig, storage: S) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        let cart = CartStore::open(storage.clone());
        let session = AuthSession::open(storage);

        debug!(
            api_url = %config.api_url,
            cart_lines = cart.len(),
            logged_in = session.has_token(),
            "Application state ready"
        );

        Ok(Self {
            config,
            api,
            cart,
            session,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore<S> {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore<S> {
        &mut self.cart
    }

    #[must_use]
    pub const fn session(&self) -> &AuthSession<S> {
        &self.session
    }

    pub const fn session_mut(&mut self) -> &mut AuthSession<S> {
        &mut self.session
    }

    /// Validate the stored token, if any. See [`AuthSession::restore`].
    ///
    /// # Errors
    ///
    /// Returns an error if the API cannot be reached.
    pub async fn restore_session(&mut self) -> Result<()> {
        self.session.restore(&self.api).await?;
        Ok(())
    }

    /// Borrow the API, the session and the cart at once, as checkout needs.
    pub const fn checkout_parts(&mut self) -> (&ApiClient, &AuthSession<S>, &mut CartStore<S>) {
        (&self.api, &self.session, &mut self.cart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kaimono_cart::{MemoryStore, ProductSnapshot};
    use kaimono_core::{Price, ProductId};

    use super::*;
    use crate::auth::TOKEN_STORAGE_KEY;

    fn config() -> StorefrontConfig {
        StorefrontConfig::from_lookup(|_| None).unwrap()
    }

    #[test]
    fn test_state_reopens_cart_and_token() {
        let storage = MemoryStore::new();
        storage.set(TOKEN_STORAGE_KEY, "abc").unwrap();

        let mut state = AppState::with_storage(config(), storage.clone()).unwrap();
        assert!(state.session().has_token());
        state
            .cart_mut()
            .add_item(&ProductSnapshot::new(ProductId::new(3), "Scarf", Price::from(2400)), 2);
        drop(state);

        let state = AppState::with_storage(config(), storage).unwrap();
        assert_eq!(state.cart().total_item_count(), 2);
        assert!(state.session().has_token());
    }

    #[test]
    fn test_file_backed_state_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.data_dir = dir.path().join("data");

        let mut state = AppState::new(config).unwrap();
        assert_eq!(state.data_dir(), dir.path().join("data"));

        state
            .cart_mut()
            .add_item(&ProductSnapshot::new(ProductId::new(1), "Tote", Price::from(1800)), 1);
        assert!(dir.path().join("data").join("cart.json").exists());
    }
}
