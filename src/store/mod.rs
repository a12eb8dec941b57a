//! Persistence port for merchant identities.
//!
//! The auth core never builds queries itself. It talks to a [`MerchantStore`], which is implemented
//! by [`PgMerchantStore`] for production and [`InMemoryMerchantStore`] for development and tests.
//!
//! Every method is a single atomic operation at the row level. In particular,
//! [`MerchantStore::update_api_key`] replaces the key in one statement, so there is never a moment
//! where the old and new key are both attached to a merchant.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::merchant::{Merchant, NewMerchant};

pub use memory::InMemoryMerchantStore;
pub use postgres::PgMerchantStore;

/// Column protected by a unique constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    CompanyName,
    ApiKey,
}

/// Errors surfaced by store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("Unique constraint violated on {0:?}")]
    Conflict(UniqueField),

    /// The backing database failed (connection, timeout, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Adapter-level failure that is not a database error.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence operations the auth core depends on.
///
/// Lookups return `Ok(None)` when no row matches. Mutations return `Ok(None)` when the target
/// merchant does not exist.
#[async_trait]
pub trait MerchantStore: Send + Sync {
    /// Insert a new merchant.
    ///
    /// # Errors
    ///
    /// `StoreError::Conflict` if the email, company name, or API key is already taken.
    async fn create(&self, merchant: NewMerchant) -> Result<Merchant, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Merchant>, StoreError>;

    /// Look up by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Merchant>, StoreError>;

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Merchant>, StoreError>;

    /// Atomically replace the merchant's API key and bump `updated_at`.
    ///
    /// # Errors
    ///
    /// `StoreError::Conflict(UniqueField::ApiKey)` if another merchant already holds `api_key`.
    async fn update_api_key(&self, id: i64, api_key: &str)
    -> Result<Option<Merchant>, StoreError>;

    /// Set the `active` flag and bump `updated_at`.
    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Merchant>, StoreError>;

    /// Cheap connectivity check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
