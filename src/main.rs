//! Merchant Auth Service - Main Application Entry Point
//!
//! REST API server that issues and validates merchant credentials: HS256 bearer tokens for
//! interactive sessions and `pk_` API keys for server-to-server calls.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx, or an in-memory store for development
//! - **Passwords**: bcrypt
//! - **Tokens**: HMAC-SHA256 signed, stateless
//!
//! # Startup Flow
//!
//! 1. Load and validate configuration (a placeholder secret in production aborts here)
//! 2. Create the merchant store (Postgres pool + migrations, or in-memory)
//! 3. Build the auth service
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port
//! 6. On Ctrl+C or SIGTERM, drain connections and log final counters

use std::sync::Arc;

use merchant_auth_service::{
    AppState, AuthService, build_router,
    auth::{PasswordHasher, TokenManager},
    cache::ApiKeyCache,
    config::{Config, StoreBackend},
    db,
    metrics::AuthMetrics,
    store::{InMemoryMerchantStore, MerchantStore, PgMerchantStore},
};
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so LOG_LEVEL can seed the filter when RUST_LOG is unset
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str())),
        )
        .init();

    tracing::info!(?config, "Configuration loaded");

    let store: Arc<dyn MerchantStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;

            let pool = db::create_pool(
                database_url,
                config.db_max_connections,
                std::time::Duration::from_secs(config.db_acquire_timeout_secs),
            )
            .await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            Arc::new(PgMerchantStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory merchant store; data will not survive restarts");
            Arc::new(InMemoryMerchantStore::new())
        }
    };

    let tokens = TokenManager::new(config.jwt_secret.as_bytes(), config.jwt_expiration()?);
    let passwords = PasswordHasher::new(config.bcrypt_cost)?;

    let mut auth = AuthService::new(store, tokens, passwords, AuthMetrics::global().clone());
    if let Some(ttl) = config.api_key_cache_ttl() {
        tracing::info!(ttl_secs = ttl.as_secs(), "API key cache enabled");
        auth = auth.with_api_key_cache(ApiKeyCache::new(ttl));
    }

    let app = build_router(AppState::new(auth));

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    AuthMetrics::global().log_metrics();
    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Ctrl+C received, starting graceful shutdown"),
        _ = terminate => tracing::info!("Terminate signal received, starting graceful shutdown"),
    }
}
