//! Metrics endpoint exposing authentication counters as JSON.

use axum::{Json, extract::State};

use crate::{metrics::AuthMetricsSnapshot, state::AppState};

/// `GET /metrics`
///
/// ```json
/// {
///   "merchants_registered": 12,
///   "logins_succeeded": 40,
///   "logins_failed": 3,
///   ...
/// }
/// ```
pub async fn metrics_export(State(state): State<AppState>) -> Json<AuthMetricsSnapshot> {
    Json(state.auth.metrics().snapshot())
}
