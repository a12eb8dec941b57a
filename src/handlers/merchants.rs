//! Merchant self-service HTTP handlers.
//!
//! All routes here sit behind the bearer token middleware:
//! - GET /api/v1/merchants/me - Current merchant profile
//! - POST /api/v1/merchants/me/api-key - Rotate the API key
//! - DELETE /api/v1/merchants/me - Deactivate the merchant

use crate::{
    error::AuthError,
    middleware::auth::AuthContext,
    models::merchant::{MerchantResponse, RegenerateApiKeyResponse},
    state::AppState,
};
use axum::{Extension, Json, extract::State, http::StatusCode};

/// Get the authenticated merchant.
///
/// # Response
///
/// - **Success (200 OK)**: Public merchant view
/// - **Error (404)**: Merchant no longer exists
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<MerchantResponse>, AuthError> {
    let merchant = state.auth.get_merchant(auth.merchant_id).await?;

    Ok(Json(merchant))
}

/// Rotate the authenticated merchant's API key.
///
/// The previous key is rejected as soon as this returns.
///
/// # Response
///
/// ```json
/// { "api_key": "pk_660e8400-e29b-41d4-a716-446655440001" }
/// ```
pub async fn regenerate_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<RegenerateApiKeyResponse>, AuthError> {
    let key = state.auth.rotate_api_key(auth.merchant_id).await?;

    Ok(Json(RegenerateApiKeyResponse {
        api_key: key.into_string(),
    }))
}

/// Deactivate the authenticated merchant (soft delete).
///
/// Sets `active = false`. The record is kept, but every outstanding token and the API key stop
/// validating.
///
/// # Response
///
/// - **Success (204 No Content)**
pub async fn deactivate_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AuthError> {
    state.auth.deactivate_merchant(auth.merchant_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
