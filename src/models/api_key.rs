//! API key value type.
//!
//! API keys are long-lived static credentials used by merchant backends. The format is a fixed
//! `pk_` prefix followed by a version-4 UUID, so a key can be told apart from a signed token at a glance.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Prefix carried by every API key.
pub const API_KEY_PREFIX: &str = "pk_";

/// A merchant API key.
///
/// # Format
///
/// `pk_550e8400-e29b-41d4-a716-446655440000`
///
/// Uniqueness relies on UUID v4 collision probability. The `merchants.api_key`
/// unique constraint is the authoritative backstop.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Generate a fresh key.
    pub fn generate() -> Self {
        Self(format!("{}{}", API_KEY_PREFIX, Uuid::new_v4()))
    }

    /// Check that a presented key has the `pk_<uuid>` shape.
    ///
    /// Used to reject garbage before it reaches the store.
    pub fn is_well_formed(candidate: &str) -> bool {
        candidate
            .strip_prefix(API_KEY_PREFIX)
            .and_then(|rest| Uuid::try_parse(rest).ok())
            .is_some()
    }

    /// SHA-256 fingerprint of a key, hex encoded (64 characters).
    ///
    /// Used as the cache key so raw API keys are never held outside the store.
    pub fn fingerprint(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());

        hex::encode(hasher.finalize())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Keep keys out of logs and panic messages.
impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey({}***)", API_KEY_PREFIX)
    }
}
