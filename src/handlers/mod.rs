//! HTTP request handlers (route handlers).
//!
//! Each handler is a thin async function that:
//! 1. Receives HTTP request data (JSON body, headers, auth context)
//! 2. Delegates to `AuthService`
//! 3. Returns HTTP response (JSON, status code)

/// Registration, login and credential validation endpoints
pub mod auth;
/// Service health endpoint
pub mod health;
/// Authenticated merchant self-service endpoints
pub mod merchants;
/// Auth counters endpoint
pub mod metrics;
