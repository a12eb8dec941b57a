//! HTTP router assembly.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{handlers, middleware, state::AppState};

/// Build the full router: public auth routes, token-protected merchant routes, and operations
/// endpoints.
pub fn build_router(state: AppState) -> Router {
    // Routes that require a valid bearer token for an active merchant
    let authenticated_routes = Router::new()
        .route(
            "/api/v1/merchants/me",
            get(handlers::merchants::get_me).delete(handlers::merchants::deactivate_me),
        )
        .route(
            "/api/v1/merchants/me/api-key",
            post(handlers::merchants::regenerate_api_key),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics_export))
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/validate", post(handlers::auth::validate_token))
        .route(
            "/api/v1/auth/validate-api-key",
            post(handlers::auth::validate_api_key),
        )
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
