//! Authentication service - composes credential primitives against the merchant store.
//!
//! This service handles:
//! - Merchant registration
//! - Login and token issuance
//! - Token and API key validation, including the `active` re-check
//! - API key rotation and merchant deactivation
//!
//! # Failure Collapsing
//!
//! Login never says which check failed. Unknown email, inactive merchant and wrong password all
//! return `InvalidCredentials`; unknown and inactive API keys both return `InvalidApiKey`. The
//! real reason is logged server-side with the merchant id only.

use std::sync::Arc;

use crate::{
    auth::{ApiKeyManager, PasswordHasher, TokenClaims, TokenManager},
    cache::ApiKeyCache,
    error::AuthError,
    metrics::AuthMetrics,
    models::{
        api_key::ApiKey,
        merchant::{
            LoginResponse, Merchant, MerchantResponse, NewMerchant, RegisterRequest,
            normalize_email,
        },
    },
    store::{MerchantStore, StoreError, UniqueField},
};

/// Attempts made to register with a fresh API key before a key collision is fatal.
const MAX_REGISTER_ATTEMPTS: usize = 2;

/// Entry point for every credential operation.
///
/// Holds only immutable configuration plus shared handles, so a single instance behind an `Arc`
/// serves all requests concurrently.
pub struct AuthService {
    store: Arc<dyn MerchantStore>,
    tokens: TokenManager,
    passwords: PasswordHasher,
    api_keys: ApiKeyManager,
    metrics: AuthMetrics,
    cache: Option<ApiKeyCache>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn MerchantStore>,
        tokens: TokenManager,
        passwords: PasswordHasher,
        metrics: AuthMetrics,
    ) -> Self {
        Self {
            store,
            tokens,
            passwords,
            api_keys: ApiKeyManager::new(),
            metrics,
            cache: None,
        }
    }

    /// Enable the API key side cache.
    pub fn with_api_key_cache(mut self, cache: ApiKeyCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn metrics(&self) -> &AuthMetrics {
        &self.metrics
    }

    pub fn store(&self) -> &Arc<dyn MerchantStore> {
        &self.store
    }

    /// Register a new merchant.
    ///
    /// # Process
    ///
    /// 1. Validate the request
    /// 2. Hash the password (off the async runtime)
    /// 3. Insert with a fresh API key, relying on the store's unique constraints
    ///
    /// Duplicates are detected by the insert itself, not a pre-check, so two concurrent
    /// registrations for the same email cannot both succeed.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest`: field validation failed
    /// - `DuplicateEmail` / `DuplicateCompanyName`: already registered
    /// - `PersistenceUnavailable`: store failure
    pub async fn register(&self, request: RegisterRequest) -> Result<Merchant, AuthError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let company_name = request.company_name.trim().to_string();
        let password_hash = self.hash_password(request.password).await?;

        let mut attempt = 1;
        let merchant = loop {
            let new_merchant = NewMerchant {
                company_name: company_name.clone(),
                email: email.clone(),
                password_hash: password_hash.clone(),
                api_key: ApiKey::generate().into_string(),
                settings: serde_json::json!({}),
            };

            match self.store.create(new_merchant).await {
                Ok(merchant) => break merchant,
                Err(StoreError::Conflict(UniqueField::Email)) => {
                    return Err(AuthError::DuplicateEmail);
                }
                Err(StoreError::Conflict(UniqueField::CompanyName)) => {
                    return Err(AuthError::DuplicateCompanyName);
                }
                Err(StoreError::Conflict(UniqueField::ApiKey))
                    if attempt < MAX_REGISTER_ATTEMPTS =>
                {
                    tracing::warn!(attempt, "API key collision on registration, regenerating");
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to create merchant: {}", e);
                    return Err(AuthError::PersistenceUnavailable(e));
                }
            }
        };

        self.metrics.record_registration();
        tracing::info!(merchant_id = merchant.id, "Merchant registered");

        Ok(merchant)
    }

    /// Authenticate with email and password.
    ///
    /// On success returns a fresh token, the current API key, and the public merchant view.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials`: unknown email, inactive merchant, or wrong password
    /// - `PersistenceUnavailable`: store failure
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let email = normalize_email(email);

        let Some(merchant) = self.store.find_by_email(&email).await? else {
            // Spend the same bcrypt work as a real check before failing.
            let passwords = self.passwords.clone();
            let password = password.to_string();
            run_blocking(move || passwords.verify_dummy(&password)).await?;

            tracing::warn!("Login failed: unknown email");
            self.metrics.record_login(false);
            return Err(AuthError::InvalidCredentials);
        };

        let password_ok = self
            .verify_password(password.to_string(), merchant.password_hash.clone())
            .await?;

        if !password_ok || !merchant.active {
            tracing::warn!(
                merchant_id = merchant.id,
                active = merchant.active,
                "Login failed"
            );
            self.metrics.record_login(false);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(merchant.id, &merchant.email)?;
        self.metrics.record_token_issued();
        self.metrics.record_login(true);
        tracing::info!(merchant_id = merchant.id, "Merchant logged in");

        Ok(LoginResponse {
            token,
            api_key: merchant.api_key.clone(),
            merchant: merchant.into(),
        })
    }

    /// Validate a token and confirm the merchant it names is still active.
    ///
    /// # Errors
    ///
    /// - Token errors from [`TokenManager::validate`]
    /// - `MerchantInactive`: merchant deactivated or no longer present
    /// - `PersistenceUnavailable`: store failure
    pub async fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.tokens.validate(token).inspect_err(|e| {
            tracing::debug!("Token rejected: {}", e.code());
            self.metrics.record_token_rejected();
        })?;

        let active = self
            .store
            .find_by_id(claims.merchant_id)
            .await?
            .is_some_and(|merchant| merchant.active);

        if !active {
            tracing::warn!(merchant_id = claims.merchant_id, "Token for inactive merchant");
            self.metrics.record_token_rejected();
            return Err(AuthError::MerchantInactive);
        }

        Ok(claims)
    }

    /// Resolve an API key to its merchant.
    ///
    /// # Errors
    ///
    /// - `InvalidApiKey`: malformed, unknown, or belonging to an inactive merchant
    /// - `PersistenceUnavailable`: store failure
    pub async fn validate_api_key(&self, api_key: &str) -> Result<Merchant, AuthError> {
        if !ApiKey::is_well_formed(api_key) {
            self.metrics.record_api_key_check(false);
            return Err(AuthError::InvalidApiKey);
        }

        if let Some(merchant) = self.cache.as_ref().and_then(|cache| cache.get(api_key)) {
            self.metrics.record_api_key_check(true);
            return Ok(merchant);
        }

        let epoch = self.cache.as_ref().map(ApiKeyCache::epoch);

        match self.store.find_by_api_key(api_key).await? {
            Some(merchant) if merchant.active => {
                if let (Some(cache), Some(epoch)) = (&self.cache, epoch) {
                    cache.insert(&merchant, epoch);
                }
                self.metrics.record_api_key_check(true);
                Ok(merchant)
            }
            Some(merchant) => {
                tracing::warn!(merchant_id = merchant.id, "API key for inactive merchant");
                self.metrics.record_api_key_check(false);
                Err(AuthError::InvalidApiKey)
            }
            None => {
                self.metrics.record_api_key_check(false);
                Err(AuthError::InvalidApiKey)
            }
        }
    }

    /// Replace a merchant's API key. The old key stops validating immediately.
    ///
    /// # Errors
    ///
    /// - `MerchantNotFound`: no merchant with this id
    /// - `PersistenceUnavailable`: store failure or repeated key collision
    pub async fn rotate_api_key(&self, merchant_id: i64) -> Result<ApiKey, AuthError> {
        let result = self
            .api_keys
            .assign_new_key(self.store.as_ref(), merchant_id)
            .await;

        // Invalidate even on error: a failed call may still have committed.
        if let Some(cache) = &self.cache {
            cache.invalidate_merchant(merchant_id);
        }

        let (_, key) = result?;
        self.metrics.record_rotation();

        Ok(key)
    }

    /// Public view of a merchant.
    pub async fn get_merchant(&self, merchant_id: i64) -> Result<MerchantResponse, AuthError> {
        self.store
            .find_by_id(merchant_id)
            .await?
            .map(MerchantResponse::from)
            .ok_or(AuthError::MerchantNotFound)
    }

    /// Soft-deactivate a merchant. Outstanding tokens and the API key stop validating.
    pub async fn deactivate_merchant(&self, merchant_id: i64) -> Result<(), AuthError> {
        let updated = self.store.set_active(merchant_id, false).await;

        if let Some(cache) = &self.cache {
            cache.invalidate_merchant(merchant_id);
        }

        updated?.ok_or(AuthError::MerchantNotFound)?;
        tracing::info!(merchant_id, "Merchant deactivated");

        Ok(())
    }

    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let passwords = self.passwords.clone();
        run_blocking(move || passwords.hash(&password)).await?
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let passwords = self.passwords.clone();
        run_blocking(move || passwords.verify(&password, &hash)).await
    }
}

/// Run CPU-heavy bcrypt work on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Internal(format!("Blocking task failed: {}", e)))
}
