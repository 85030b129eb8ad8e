//! Errors raised by the storefront collaborators.
//!
//! The cart itself never fails; everything that can go wrong while talking to
//! the ProductAPI, restoring a session or placing an order surfaces as an
//! [`ApiError`].

use kaimono_cart::StorageError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when interacting with the ProductAPI.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// API answered with a non-success status.
    #[error("API error ({status}): {detail}")]
    Status { status: StatusCode, detail: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials missing, expired or rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The operation needs a logged-in session.
    #[error("Not logged in")]
    NotLoggedIn,

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Client-side validation failed before anything was sent.
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Local key-value storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Build the error for a non-success response body.
    ///
    /// FastAPI-style bodies carry a `detail` that is either a message or a
    /// list of validation errors; anything else is reported verbatim.
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let detail = extract_detail(body).unwrap_or_else(|| {
            let snippet: String = body.chars().take(200).collect();
            if snippet.is_empty() {
                status.canonical_reason().unwrap_or("no details").to_string()
            } else {
                snippet
            }
        });

        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(detail),
            StatusCode::FORBIDDEN => Self::Forbidden(detail),
            StatusCode::NOT_FOUND => Self::NotFound(detail),
            _ => Self::Status { status, detail },
        }
    }

    /// Whether the API rejected the request itself (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Status { status, .. } => status.is_client_error(),
            Self::NotFound(_) | Self::Unauthorized(_) | Self::Forbidden(_) => true,
            _ => false,
        }
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(message) => Some(message.clone()),
        serde_json::Value::Array(errors) => Some(format_validation_errors(errors)),
        other => Some(other.to_string()),
    }
}

fn format_validation_errors(errors: &[serde_json::Value]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .map(|e| {
            let message = e
                .get("msg")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("invalid value");
            let location = e
                .get("loc")
                .and_then(serde_json::Value::as_array)
                .map(|loc| {
                    loc.iter()
                        .map(|p| match p {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(".")
                })
                .filter(|loc| !loc.is_empty());

            match location {
                Some(loc) => format!("{message} (at {loc})"),
                None => message.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_detail() {
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, r#"{"detail":"Username taken"}"#);
        assert_eq!(err.to_string(), "API error (400 Bad Request): Username taken");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ApiError::from_response(StatusCode::UNAUTHORIZED, r#"{"detail":"bad token"}"#),
            ApiError::Unauthorized(ref d) if d == "bad token"
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::FORBIDDEN, "{}"),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::NOT_FOUND, r#"{"detail":"missing"}"#),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_validation_detail() {
        let body = r#"{"detail":[
            {"loc":["body","items",0,"quantity"],"msg":"field required","type":"missing"},
            {"loc":[],"msg":"bad"}
        ]}"#;
        let err = ApiError::from_response(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(
            err.to_string(),
            "API error (422 Unprocessable Entity): field required (at body.items.0.quantity); bad"
        );
    }

    #[test]
    fn test_non_json_body() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, ApiError::Status { ref detail, .. } if detail == "upstream down"));
        assert!(!err.is_client_error());

        let err = ApiError::from_response(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(matches!(err, ApiError::Status { ref detail, .. } if detail == "Service Unavailable"));
    }

    #[test]
    fn test_local_errors_are_not_client_errors() {
        assert!(!ApiError::NotLoggedIn.is_client_error());
        assert!(!ApiError::EmptyCart.is_client_error());
    }
}
