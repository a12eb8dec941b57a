//! Merchant Auth Service
//!
//! Issues and validates credentials for merchant accounts: short-lived HS256 bearer tokens and
//! long-lived `pk_` API keys.
//!
//! # Layout
//!
//! - [`auth`]: password hashing, token manager, API key rotation
//! - [`services::AuthService`]: register, login, validation and rotation against a [`store::MerchantStore`]
//! - [`store`]: persistence port with Postgres and in-memory adapters
//! - [`routes`], [`handlers`], [`middleware`]: axum transport layer

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use error::AuthError;
pub use routes::build_router;
pub use services::AuthService;
pub use state::AppState;
