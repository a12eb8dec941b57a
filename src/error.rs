//! Error types and HTTP error response handling.
//!
//! This module defines every failure the auth core can report and how each one is converted
//! into an HTTP response with an appropriate status code and JSON body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

/// Auth-core error type.
///
/// Every variant is a distinct tag so callers can map failures to responses without parsing
/// messages.
///
/// # Error Categories
///
/// - **Token Errors**: structure, algorithm, signature, and validity window
/// - **Credential Errors**: login, API key, and inactive merchants
/// - **Registration Errors**: uniqueness and input validation
/// - **Infrastructure Errors**: store failures and internal faults
///
/// `InvalidCredentials` and `InvalidApiKey` are deliberately vague. They never say which part of
/// the credential was wrong.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Token is not three base64url segments with JSON header and claims.
    #[error("Malformed token")]
    MalformedToken,

    /// Token header declares an algorithm other than HS256 (including `none`).
    #[error("Unexpected signing algorithm")]
    UnexpectedAlgorithm,

    /// Signature does not match the header and claims.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Current time is at or past `exp`.
    #[error("Token expired")]
    Expired,

    /// Current time is before `nbf`.
    #[error("Token not yet valid")]
    NotYetValid,

    /// Login failed. Covers unknown email, inactive merchant, and wrong password alike.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Token is cryptographically valid but the merchant is inactive or gone.
    #[error("Merchant is inactive")]
    MerchantInactive,

    /// API key is unknown or belongs to an inactive merchant.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Normalized email is already registered.
    #[error("Email already registered")]
    DuplicateEmail,

    /// Company name is already registered.
    #[error("Company name already registered")]
    DuplicateCompanyName,

    /// Referenced merchant does not exist.
    #[error("Merchant not found")]
    MerchantNotFound,

    /// Store call failed. Wraps the underlying error, which is logged but never sent to clients.
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(#[from] StoreError),

    /// Request body or parameters are invalid.
    ///
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Unexpected internal failure (hashing, serialization, task join).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnexpectedAlgorithm => "unexpected_algorithm",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "token_expired",
            AuthError::NotYetValid => "token_not_yet_valid",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MerchantInactive => "merchant_inactive",
            AuthError::InvalidApiKey => "invalid_api_key",
            AuthError::DuplicateEmail => "duplicate_email",
            AuthError::DuplicateCompanyName => "duplicate_company_name",
            AuthError::MerchantNotFound => "merchant_not_found",
            AuthError::PersistenceUnavailable(_) => "persistence_unavailable",
            AuthError::InvalidRequest(_) => "invalid_request",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Whether this error came from token checks (structure, algorithm, signature, time).
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedToken
                | AuthError::UnexpectedAlgorithm
                | AuthError::InvalidSignature
                | AuthError::Expired
                | AuthError::NotYetValid
        )
    }
}

/// Convert AuthError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - Token errors, `InvalidCredentials`, `InvalidApiKey` → 401 Unauthorized
/// - `MerchantInactive` → 403 Forbidden
/// - `MerchantNotFound` → 404 Not Found
/// - `DuplicateEmail`, `DuplicateCompanyName` → 409 Conflict
/// - `InvalidRequest` → 400 Bad Request
/// - `PersistenceUnavailable` → 503 Service Unavailable (hides details from client)
/// - `Internal` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let code = self.code();

        let (status, message) = match self {
            ref e if e.is_token_error() => (StatusCode::UNAUTHORIZED, e.to_string()),
            AuthError::InvalidCredentials | AuthError::InvalidApiKey => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AuthError::MerchantInactive => (StatusCode::FORBIDDEN, self.to_string()),
            AuthError::MerchantNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AuthError::DuplicateEmail | AuthError::DuplicateCompanyName => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AuthError::InvalidRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AuthError::PersistenceUnavailable(ref err) => {
                tracing::error!("Store failure: {}", err);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                )
            }
            AuthError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            _ => (StatusCode::UNAUTHORIZED, self.to_string()),
        };

        // Build JSON response body
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
