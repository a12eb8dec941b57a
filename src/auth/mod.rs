//! Credential primitives: password hashing, signed tokens, and API key rotation.

pub mod api_key;
pub mod password;
pub mod token;

pub use api_key::ApiKeyManager;
pub use password::PasswordHasher;
pub use token::{TokenClaims, TokenManager};
