//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `KAIMONO_API_URL` - Base URL of the ProductAPI (default: `http://localhost:8000`)
//! - `KAIMONO_DATA_DIR` - Directory for the local cart and token slots (default: `.kaimono`)
//! - `KAIMONO_CACHE_TTL_SECS` - Product cache time-to-live in seconds (default: 300)
//! - `KAIMONO_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_DATA_DIR: &str = ".kaimono";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// ProductAPI base URL; endpoints live under `/api/`
    pub api_url: Url,
    /// Root directory of the local key-value slots
    pub data_dir: PathBuf,
    /// How long product listings and details stay cached
    pub cache_ttl: Duration,
    /// Per-request timeout for ProductAPI calls
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = parse_api_url(&get_or_default(&lookup, "KAIMONO_API_URL", DEFAULT_API_URL))?;
        let data_dir = PathBuf::from(get_or_default(&lookup, "KAIMONO_DATA_DIR", DEFAULT_DATA_DIR));
        let cache_ttl = get_secs(&lookup, "KAIMONO_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        let http_timeout = get_secs(&lookup, "KAIMONO_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        if http_timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "KAIMONO_HTTP_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            data_dir,
            cache_ttl,
            http_timeout,
            sentry_dsn: get_optional(&lookup, "SENTRY_DSN"),
            sentry_environment: get_optional(&lookup, "SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional variable, treating empty values as unset.
fn get_optional<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Get a variable with a default value.
fn get_or_default<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: &str) -> String {
    get_optional(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Get a whole number of seconds.
fn get_secs<F: Fn(&str) -> Option<String>>(
    lookup: &F,
    key: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    get_optional(lookup, key).map_or(Ok(Duration::from_secs(default)), |raw| {
        raw.trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse the API base URL. A trailing slash is added so `Url::join` keeps
/// any path prefix the API is mounted under.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar("KAIMONO_API_URL".to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            "KAIMONO_API_URL".to_string(),
            "must be an http(s) URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.data_dir, PathBuf::from(".kaimono"));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_api_url_keeps_path_prefix() {
        let config = load(&[("KAIMONO_API_URL", "https://shop.example.com/backend")]).unwrap();
        assert_eq!(config.api_url.as_str(), "https://shop.example.com/backend/");
        assert_eq!(
            config.api_url.join("api/products").unwrap().as_str(),
            "https://shop.example.com/backend/api/products"
        );
    }

    #[test]
    fn test_invalid_api_url() {
        let err = load(&[("KAIMONO_API_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "KAIMONO_API_URL"));
    }

    #[test]
    fn test_invalid_ttl() {
        let err = load(&[("KAIMONO_CACHE_TTL_SECS", "five")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(load(&[("KAIMONO_HTTP_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let config = load(&[("KAIMONO_DATA_DIR", "  "), ("SENTRY_DSN", "")]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from(".kaimono"));
        assert!(config.sentry_dsn.is_none());
    }
}
