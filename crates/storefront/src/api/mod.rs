//! ProductAPI client.
//!
//! Uses `reqwest` for HTTP and caches catalog reads (product list, product
//! details, categories) with `moka`. Seller mutations invalidate the cache.
//!
//! # Authentication
//!
//! The API accepts the bearer token two ways: order and seller endpoints take
//! it as a `token` query parameter, while `/api/auth/me` and the admin
//! endpoints expect an `Authorization: Bearer` header.

mod cache;
pub mod types;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use kaimono_core::{OrderId, ProductId, UserId};

use crate::config::StorefrontConfig;
use crate::error::{ApiError, Result};

use cache::{CacheKey, CacheValue};
pub use types::*;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the ProductAPI.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("cached_entries", &self.inner.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new ProductAPI client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                cache,
            }),
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Drop every cached catalog entry.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.inner.base_url.join(path)?;
        Ok(self.inner.client.request(method, url))
    }

    /// Send a request and decode a JSON body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let error = ApiError::from_response(status, &body);
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "ProductAPI returned server error"
                );
            } else {
                debug!(status = %status, error = %error, "ProductAPI rejected request");
            }
            return Err(error);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse ProductAPI response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List active, non-deleted products (sold-out ones included).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Products).await {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let products: Vec<Product> = self.execute(self.request(Method::GET, "api/products")?).await?;

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if there is no such product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .execute(self.request(Method::GET, &format!("api/products/{id}"))?)
            .await?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            return Ok(categories);
        }

        let categories: Vec<Category> = self
            .execute(self.request(Method::GET, "api/categories")?)
            .await?;

        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// Products listed by one seller (their public shop page).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn user_products(&self, user_id: UserId) -> Result<Vec<Product>> {
        self.execute(self.request(Method::GET, &format!("api/users/{user_id}/products"))?)
            .await
    }

    /// Public profile of a user, used as the header of their shop page.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown user.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user(&self, user_id: UserId) -> Result<Seller> {
        self.execute(self.request(Method::GET, &format!("api/users/{user_id}"))?)
            .await
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange a username and password for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for wrong credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<TokenResponse> {
        let request = self
            .request(Method::POST, "api/auth/login")?
            .form(&[("username", username), ("password", password.expose_secret())]);
        self.execute(request).await
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the email or username is taken.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<User> {
        let request = self
            .request(Method::POST, "api/auth/register")?
            .json(registration);
        self.execute(request).await
    }

    /// Resolve the user a token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is invalid or expired.
    #[instrument(skip(self, token))]
    pub async fn me(&self, token: &SecretString) -> Result<User> {
        let request = self
            .request(Method::GET, "api/auth/me")?
            .bearer_auth(token.expose_secret());
        self.execute(request).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the order.
    #[instrument(skip(self, token, order), fields(lines = order.items.len()))]
    pub async fn submit_order(&self, token: &SecretString, order: &OrderRequest) -> Result<Order> {
        let request = self
            .request(Method::POST, "api/orders/")?
            .query(&[("token", token.expose_secret())])
            .json(order);
        let order: Order = self.execute(request).await?;

        // Stock changed server-side.
        self.invalidate_catalog();

        Ok(order)
    }

    /// Order history of the logged-in user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn list_orders(&self, token: &SecretString) -> Result<Vec<Order>> {
        let request = self
            .request(Method::GET, "api/orders/")?
            .query(&[("token", token.expose_secret())]);
        self.execute(request).await
    }

    /// One order of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist or belongs to someone else.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &SecretString, id: OrderId) -> Result<Order> {
        let request = self
            .request(Method::GET, &format!("api/orders/{id}"))?
            .query(&[("token", token.expose_secret())]);
        self.execute(request).await
    }

    // =========================================================================
    // Seller store
    // =========================================================================

    /// Listings of the logged-in seller, including sold ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn my_products(&self, token: &SecretString) -> Result<Vec<Product>> {
        let request = self
            .request(Method::GET, "api/my-products")?
            .query(&[("token", token.expose_secret())]);
        self.execute(request).await
    }

    /// List a new product for sale.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the listing.
    #[instrument(skip(self, token, product), fields(name = %product.name))]
    pub async fn create_product(&self, token: &SecretString, product: &NewProduct) -> Result<Product> {
        let request = self
            .request(Method::POST, "api/products")?
            .query(&[("token", token.expose_secret())])
            .json(product);
        let created = self.execute(request).await?;
        self.invalidate_catalog();
        Ok(created)
    }

    /// Edit a listing. Only its seller or an admin may do this.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` when editing someone else's listing.
    #[instrument(skip(self, token, update), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &SecretString,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product> {
        let request = self
            .request(Method::PUT, &format!("api/products/{id}"))?
            .query(&[("token", token.expose_secret())])
            .json(update);
        let updated = self.execute(request).await?;
        self.invalidate_catalog();
        Ok(updated)
    }

    /// Soft-delete a listing. Only its seller or an admin may do this.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` when deleting someone else's listing.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &SecretString, id: ProductId) -> Result<MessageResponse> {
        let request = self
            .request(Method::DELETE, &format!("api/products/{id}"))?
            .query(&[("token", token.expose_secret())]);
        let response = self.execute(request).await?;
        self.invalidate_catalog();
        Ok(response)
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// All user accounts. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin tokens.
    #[instrument(skip(self, token))]
    pub async fn admin_list_users(&self, token: &SecretString) -> Result<Vec<User>> {
        let request = self
            .request(Method::GET, "api/admin/users")?
            .bearer_auth(token.expose_secret());
        self.execute(request).await
    }

    /// Edit a user account. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin tokens.
    #[instrument(skip(self, token, update), fields(user_id = %id))]
    pub async fn admin_update_user(
        &self,
        token: &SecretString,
        id: UserId,
        update: &UserUpdate,
    ) -> Result<MessageResponse> {
        let request = self
            .request(Method::PUT, &format!("api/admin/users/{id}"))?
            .bearer_auth(token.expose_secret())
            .json(update);
        self.execute(request).await
    }

    /// Delete a user account and soft-delete their listings. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin tokens; the API refuses
    /// to delete other admins.
    #[instrument(skip(self, token), fields(user_id = %id))]
    pub async fn admin_delete_user(&self, token: &SecretString, id: UserId) -> Result<MessageResponse> {
        let request = self
            .request(Method::DELETE, &format!("api/admin/users/{id}"))?
            .bearer_auth(token.expose_secret());
        let response = self.execute(request).await?;
        self.invalidate_catalog();
        Ok(response)
    }
}
