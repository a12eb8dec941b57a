//! Merchant data models and API request/response types.
//!
//! This module defines:
//! - `Merchant`: Database entity representing a merchant identity
//! - `NewMerchant`: Row data handed to the store on registration
//! - Request bodies for registration and login
//! - `MerchantResponse`: Public view returned to clients (no password hash)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{auth::password::MAX_PASSWORD_BYTES, error::AuthError};

/// Represents a merchant record from the database.
///
/// # Database Table
///
/// Maps to the `merchants` table. Each merchant:
/// - Is identified by a `BIGSERIAL` id that never changes
/// - Owns exactly one active API key at a time
/// - Can be soft-deactivated, which fails every credential check
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Merchant {
    /// Unique identifier for this merchant
    pub id: i64,

    /// Company name, unique across merchants
    pub company_name: String,

    /// Normalized (trimmed, lower-cased) email, unique across merchants
    pub email: String,

    /// bcrypt hash of the account password
    ///
    /// Never serialized. Use `MerchantResponse` when data leaves the service.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Current API key (`pk_<uuid>`)
    ///
    /// Replaced only through rotation. Unique across merchants.
    pub api_key: String,

    /// Whether this merchant may authenticate at all
    pub active: bool,

    /// Free-form JSON settings, stored as `jsonb` and never interpreted here
    pub settings: serde_json::Value,

    /// Timestamp when merchant was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last mutation (API key rotation, deactivation)
    pub updated_at: DateTime<Utc>,
}

/// Row data for inserting a new merchant.
///
/// The store assigns `id`, `active`, and both timestamps.
#[derive(Debug, Clone)]
pub struct NewMerchant {
    pub company_name: String,
    pub email: String,
    pub password_hash: String,
    pub api_key: String,
    pub settings: serde_json::Value,
}

/// Normalize an email for storage and lookup.
///
/// Emails are compared case-insensitively, so `Acme@Example.com` and
/// `acme@example.com` refer to the same merchant.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Request body for registering a new merchant.
///
/// # JSON Example
///
/// ```json
/// {
///   "company_name": "Acme Corp",
///   "email": "acme@example.com",
///   "password": "password123"
/// }
/// ```
///
/// # Validation
///
/// - `company_name`: 3 to 100 characters
/// - `email`: must look like `local@domain.tld`
/// - `password`: at least 8 characters and at most 72 bytes
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub company_name: String,
    pub email: String,
    pub password: String,
}

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LEN: usize = 8;

impl RegisterRequest {
    /// Check field constraints before any hashing or store access happens.
    pub fn validate(&self) -> Result<(), AuthError> {
        let name_len = self.company_name.trim().chars().count();
        if !(3..=100).contains(&name_len) {
            return Err(AuthError::InvalidRequest(
                "company_name must be between 3 and 100 characters".to_string(),
            ));
        }

        if !is_plausible_email(&self.email) {
            return Err(AuthError::InvalidRequest(
                "email is not a valid address".to_string(),
            ));
        }

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidRequest(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        if self.password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::InvalidRequest(format!(
                "password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        Ok(())
    }
}

/// Shallow syntactic check: one `@`, non-empty local part, dotted domain.
fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

/// Request body for logging in.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response body for a successful login.
///
/// # JSON Example
///
/// ```json
/// {
///   "token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...",
///   "api_key": "pk_550e8400-e29b-41d4-a716-446655440000",
///   "merchant": { "id": 1, "company_name": "Acme Corp", ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub api_key: String,
    pub merchant: MerchantResponse,
}

/// Public view of a merchant.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": 1,
///   "company_name": "Acme Corp",
///   "email": "acme@example.com",
///   "api_key": "pk_550e8400-e29b-41d4-a716-446655440000",
///   "active": true,
///   "created_at": "2025-12-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantResponse {
    pub id: i64,
    pub company_name: String,
    pub email: String,
    pub api_key: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Convert database Merchant to API MerchantResponse.
///
/// This transformation drops `password_hash`, `settings` and `updated_at`.
impl From<Merchant> for MerchantResponse {
    fn from(merchant: Merchant) -> Self {
        Self {
            id: merchant.id,
            company_name: merchant.company_name,
            email: merchant.email,
            api_key: merchant.api_key,
            active: merchant.active,
            created_at: merchant.created_at,
        }
    }
}

/// Request body for token validation.
#[derive(Debug, Deserialize)]
pub struct ValidateTokenRequest {
    pub token: String,
}

/// Response body for token and API key validation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<i64>,
}

/// Response body for API key rotation.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegenerateApiKeyResponse {
    pub api_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_merchant() -> Merchant {
        Merchant {
            id: 7,
            company_name: "Acme Corp".to_string(),
            email: "acme@example.com".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            api_key: "pk_550e8400-e29b-41d4-a716-446655440000".to_string(),
            active: true,
            settings: serde_json::json!({ "webhook_url": "https://acme.example" }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Acme@Example.COM "), "acme@example.com");
    }

    #[test]
    fn test_merchant_serialization_hides_password_hash() {
        let json = serde_json::to_value(sample_merchant()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "acme@example.com");
    }

    #[test]
    fn test_public_view_strips_confidential_fields() {
        let response = MerchantResponse::from(sample_merchant());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(response.id, 7);
        assert!(json.get("password_hash").is_none());
        assert!(json.get("settings").is_none());
    }

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            company_name: "Acme Corp".to_string(),
            email: "acme@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid.validate().is_ok());

        let short_name = RegisterRequest {
            company_name: "Ac".to_string(),
            ..valid_clone(&valid)
        };
        assert!(matches!(short_name.validate(), Err(AuthError::InvalidRequest(_))));

        let bad_email = RegisterRequest {
            email: "acme.example.com".to_string(),
            ..valid_clone(&valid)
        };
        assert!(matches!(bad_email.validate(), Err(AuthError::InvalidRequest(_))));

        let short_password = RegisterRequest {
            password: "short".to_string(),
            ..valid_clone(&valid)
        };
        assert!(matches!(short_password.validate(), Err(AuthError::InvalidRequest(_))));

        let longest_password = RegisterRequest {
            password: "p".repeat(72),
            ..valid_clone(&valid)
        };
        assert!(longest_password.validate().is_ok());

        let overlong_password = RegisterRequest {
            password: format!("{}REAL", "p".repeat(72)),
            ..valid_clone(&valid)
        };
        assert!(matches!(overlong_password.validate(), Err(AuthError::InvalidRequest(_))));
    }

    #[test]
    fn test_email_plausibility() {
        assert!(is_plausible_email("a@b.co"));
        assert!(!is_plausible_email("a@b"));
        assert!(!is_plausible_email("@b.co"));
        assert!(!is_plausible_email("a@@b.co"));
        assert!(!is_plausible_email("a@b..co"));
        assert!(!is_plausible_email("a b@c.co"));
    }

    fn valid_clone(request: &RegisterRequest) -> RegisterRequest {
        RegisterRequest {
            company_name: request.company_name.clone(),
            email: request.email.clone(),
            password: request.password.clone(),
        }
    }
}
