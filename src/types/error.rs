//! Error types for sessiongate
//!
//! Every failure in the sign-in, gate and logout paths is one of these
//! variants. The HTTP layer renders them as `{"status": "error", "error": ..}`
//! and never echoes the detail of a 5xx variant back to the client.

use hyper::StatusCode;
use serde_json::{json, Value};

/// Main error type for sessiongate operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Malformed or insufficient input; carries every violated rule.
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Session store or user database unreachable (or too slow)
    #[error("Dependency error: {0}")]
    Dependency(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            // Unknown users are reported as a bad sign-in request
            Self::NotFound(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure is on our side rather than the caller's
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Client-facing `error` field.
    ///
    /// Validation failures become a list; server-side failures are reduced to
    /// their category so connection strings and driver messages stay in logs.
    pub fn public_message(&self) -> Value {
        match self {
            Self::Validation(violations) => json!(violations),
            Self::BadRequest(msg)
            | Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Conflict(msg) => json!(msg),
            Self::Dependency(_) => json!("service dependency unavailable"),
            Self::Signing(_) => json!("cannot issue token"),
            Self::Internal(_) | Self::Config(_) => json!("internal server error"),
        }
    }

    /// Convert to status code and JSON body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, Value) {
        let status = self.status_code();
        let body = json!({
            "status": "error",
            "error": self.public_message(),
        });
        (status, body)
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type alias for sessiongate operations
pub type Result<T> = std::result::Result<T, AuthError>;
