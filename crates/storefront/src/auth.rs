//! Authenticated session of the shopper.
//!
//! The bearer token lives in the same local key-value store as the cart, under
//! its own slot, so a restarted client stays logged in. Logging out drops the
//! token only; the cart survives across sessions.

use kaimono_cart::KeyValueStore;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, User};
use crate::error::{ApiError, Result};

/// Fixed key of the slot holding the bearer token.
pub const TOKEN_STORAGE_KEY: &str = "token";

/// Current identity and credential of the shopper.
pub struct AuthSession<S: KeyValueStore> {
    storage: S,
    token: Option<SecretString>,
    user: Option<User>,
}

impl<S: KeyValueStore> AuthSession<S> {
    /// Open the session, picking up a token persisted by an earlier run.
    ///
    /// The token is not validated until [`restore`](Self::restore) is called.
    pub fn open(storage: S) -> Self {
        let token = match storage.get(TOKEN_STORAGE_KEY) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()).map(SecretString::from),
            Err(error) => {
                warn!(%error, "Failed to read stored token");
                None
            }
        };

        Self {
            storage,
            token,
            user: None,
        }
    }

    /// Validate the stored token and load the user it belongs to.
    ///
    /// A token the API rejects is discarded. Returns `Ok(None)` when there is
    /// no session.
    ///
    /// # Errors
    ///
    /// Returns an error if the API cannot be reached; the token is kept so a
    /// later attempt can succeed.
    pub async fn restore(&mut self, api: &ApiClient) -> Result<Option<&User>> {
        let Some(token) = &self.token else {
            return Ok(None);
        };

        match api.me(token).await {
            Ok(user) => {
                debug!(username = %user.username, "Session restored");
                self.user = Some(user);
                Ok(self.user.as_ref())
            }
            Err(error) if error.is_client_error() => {
                info!(%error, "Stored token rejected; logging out");
                self.logout();
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Log in and remember the token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for wrong credentials.
    pub async fn login(
        &mut self,
        api: &ApiClient,
        username: &str,
        password: &SecretString,
    ) -> Result<&User> {
        let response = api.login(username, password).await?;
        let token = SecretString::from(response.access_token);
        let user = api.me(&token).await?;

        if let Err(error) = self.storage.set(TOKEN_STORAGE_KEY, token.expose_secret()) {
            warn!(%error, "Failed to persist token; session will not survive a restart");
        }

        info!(username = %user.username, role = %user.role, "Logged in");
        self.token = Some(token);
        Ok(self.user.insert(user))
    }

    /// Forget the token. The cart is deliberately left alone.
    pub fn logout(&mut self) {
        self.token = None;
        self.user = None;
        if let Err(error) = self.storage.remove(TOKEN_STORAGE_KEY) {
            warn!(%error, "Failed to remove stored token");
        }
    }

    /// Whether a token is held (validated or not).
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// The validated user, if [`restore`](Self::restore) or
    /// [`login`](Self::login) succeeded.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotLoggedIn` without a token.
    pub fn token(&self) -> Result<&SecretString> {
        self.token.as_ref().ok_or(ApiError::NotLoggedIn)
    }

    /// The bearer token of a validated admin.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotLoggedIn` without a validated user and
    /// `ApiError::Forbidden` for non-admins.
    pub fn require_admin(&self) -> Result<&SecretString> {
        let token = self.token()?;
        match &self.user {
            Some(user) if user.is_admin() => Ok(token),
            Some(user) => Err(ApiError::Forbidden(format!(
                "{} is not an administrator",
                user.username
            ))),
            None => Err(ApiError::NotLoggedIn),
        }
    }
}
