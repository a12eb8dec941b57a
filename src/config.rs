//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct,
//! then validates the result. A configuration that fails validation aborts startup.

use serde::Deserialize;

/// Signing secret shipped as the default. Refused in production.
pub const PLACEHOLDER_JWT_SECRET: &str = "your-super-secret-jwt-key-change-in-production";

/// Longest token lifetime accepted from `JWT_EXPIRATION_SECS` (one year).
pub const MAX_JWT_EXPIRATION_SECS: u64 = 365 * 86_400;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// Which merchant store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `ENV` (optional): `development` or `production`, defaults to development
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 8081
/// - `STORE_BACKEND` (optional): `postgres` or `memory`, defaults to postgres
/// - `DATABASE_URL` (required for postgres): PostgreSQL connection string
/// - `DB_MAX_CONNECTIONS` (optional): pool size, defaults to 25
/// - `DB_ACQUIRE_TIMEOUT_SECS` (optional): pool acquire timeout, defaults to 5
/// - `JWT_SECRET` (optional outside production): HMAC signing secret
/// - `JWT_EXPIRATION_SECS` (optional): token lifetime, defaults to 86400, at most one year
/// - `BCRYPT_COST` (optional): bcrypt work factor, defaults to 12
/// - `API_KEY_CACHE_TTL_SECS` (optional): API key cache TTL, 0 disables the cache
/// - `LOG_LEVEL` (optional): used when `RUST_LOG` is unset, defaults to info
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub env: Environment,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default)]
    pub store_backend: StoreBackend,

    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_acquire_timeout")]
    pub db_acquire_timeout_secs: u64,

    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: u64,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    #[serde(default)]
    pub api_key_cache_ttl_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    8081
}

fn default_max_connections() -> u32 {
    25
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_jwt_secret() -> String {
    PLACEHOLDER_JWT_SECRET.to_string()
}

/// 24 hours.
fn default_jwt_expiration() -> u64 {
    86_400
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors. Each one is fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("JWT_SECRET must be changed in production")]
    PlaceholderSecret,

    #[error("DATABASE_URL is required when STORE_BACKEND=postgres")]
    MissingDatabaseUrl,

    #[error("JWT_EXPIRATION_SECS must be greater than zero")]
    InvalidExpiration,

    #[error("JWT_EXPIRATION_SECS must be at most {MAX_JWT_EXPIRATION_SECS}, got {0}")]
    ExpirationTooLong(u64),

    #[error("BCRYPT_COST must be between 4 and 31, got {0}")]
    InvalidBcryptCost(u32),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Environment variable values cannot be parsed into expected types
    /// - The resulting configuration fails [`Config::validate`]
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        let config = envy::from_env::<Config>()?;
        config.validate()?;

        Ok(config)
    }

    /// Build configuration from explicit `(NAME, value)` pairs instead of the process environment.
    pub fn from_iter<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)?;
        config.validate()?;

        Ok(config)
    }

    /// Reject configurations the service must never start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.env == Environment::Production && self.jwt_secret == PLACEHOLDER_JWT_SECRET {
            return Err(ConfigError::PlaceholderSecret);
        }

        if self.store_backend == StoreBackend::Postgres
            && self.database_url.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        if self.jwt_expiration_secs == 0 {
            return Err(ConfigError::InvalidExpiration);
        }
        if self.jwt_expiration_secs > MAX_JWT_EXPIRATION_SECS {
            return Err(ConfigError::ExpirationTooLong(self.jwt_expiration_secs));
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(self.bcrypt_cost));
        }

        Ok(())
    }

    /// Token lifetime as a signed duration.
    pub fn jwt_expiration(&self) -> Result<chrono::Duration, ConfigError> {
        i64::try_from(self.jwt_expiration_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or(ConfigError::ExpirationTooLong(self.jwt_expiration_secs))
    }

    /// API key cache TTL, or `None` when the cache is disabled.
    pub fn api_key_cache_ttl(&self) -> Option<std::time::Duration> {
        (self.api_key_cache_ttl_secs > 0)
            .then(|| std::time::Duration::from_secs(self.api_key_cache_ttl_secs))
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("env", &self.env)
            .field("server_port", &self.server_port)
            .field("store_backend", &self.store_backend)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("db_max_connections", &self.db_max_connections)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("api_key_cache_ttl_secs", &self.api_key_cache_ttl_secs)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}
