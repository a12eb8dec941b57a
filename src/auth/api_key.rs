//! API key assignment and rotation.

use crate::{
    error::AuthError,
    models::{api_key::ApiKey, merchant::Merchant},
    store::{MerchantStore, StoreError, UniqueField},
};

/// Attempts made before a key collision is treated as fatal.
pub const MAX_KEY_ATTEMPTS: usize = 2;

/// Generates and persists merchant API keys.
///
/// Stateless: the store is passed per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiKeyManager;

impl ApiKeyManager {
    pub fn new() -> Self {
        Self
    }

    /// Generate a new key and make it the merchant's only active key.
    ///
    /// # Process
    ///
    /// 1. Generate `pk_<uuid>`
    /// 2. Replace the stored key in one atomic update
    /// 3. On a key collision, retry once with a fresh key
    ///
    /// The previous key stops matching any lookup as soon as the update commits.
    ///
    /// # Errors
    ///
    /// - `MerchantNotFound`: no merchant with this id
    /// - `PersistenceUnavailable`: store failure, or a collision on both attempts
    pub async fn assign_new_key(
        &self,
        store: &dyn MerchantStore,
        merchant_id: i64,
    ) -> Result<(Merchant, ApiKey), AuthError> {
        let mut attempt = 1;

        loop {
            let key = ApiKey::generate();

            match store.update_api_key(merchant_id, key.as_str()).await {
                Ok(Some(merchant)) => {
                    tracing::info!(merchant_id, "API key rotated");
                    return Ok((merchant, key));
                }
                Ok(None) => return Err(AuthError::MerchantNotFound),
                Err(StoreError::Conflict(UniqueField::ApiKey)) if attempt < MAX_KEY_ATTEMPTS => {
                    tracing::warn!(merchant_id, attempt, "API key collision, regenerating");
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(merchant_id, "Failed to store API key: {}", e);
                    return Err(AuthError::PersistenceUnavailable(e));
                }
            }
        }
    }
}
