//! Data models representing database entities and API payloads.

/// API key value type
pub mod api_key;
/// Merchant identity model and request/response bodies
pub mod merchant;
