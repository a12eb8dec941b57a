//! Public authentication HTTP handlers.
//!
//! This module implements the unauthenticated endpoints:
//! - POST /api/v1/auth/register - Register a merchant
//! - POST /api/v1/auth/login - Exchange email/password for a token
//! - POST /api/v1/auth/validate - Check a token
//! - POST /api/v1/auth/validate-api-key - Check an API key

use crate::{
    error::AuthError,
    models::merchant::{
        LoginRequest, LoginResponse, MerchantResponse, RegisterRequest, ValidateResponse,
        ValidateTokenRequest,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};

/// Header carrying a merchant API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Register a new merchant.
///
/// # Endpoint
///
/// `POST /api/v1/auth/register`
///
/// # Request Body
///
/// ```json
/// {
///   "company_name": "Acme Corp",
///   "email": "acme@example.com",
///   "password": "password123"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: Returns the merchant, including its first API key
/// - **Error (400)**: Validation failed
/// - **Error (409)**: Email or company name already registered
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MerchantResponse>), AuthError> {
    let merchant = state.auth.register(request).await?;

    Ok((StatusCode::CREATED, Json(merchant.into())))
}

/// Log in with email and password.
///
/// # Endpoint
///
/// `POST /api/v1/auth/login`
///
/// # Response
///
/// - **Success (200 OK)**: `{ "token", "api_key", "merchant" }`
/// - **Error (401)**: `invalid_credentials` for any failure, with no hint as to which part was wrong
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let response = state.auth.login(&request.email, &request.password).await?;

    Ok(Json(response))
}

/// Validate a token.
///
/// # Endpoint
///
/// `POST /api/v1/auth/validate`
///
/// # Response
///
/// - **Success (200 OK)**: `{ "valid": true, "merchant_id": 1 }`
/// - **Error (401)**: Token malformed, wrongly signed, or expired
/// - **Error (403)**: Merchant inactive
pub async fn validate_token(
    State(state): State<AppState>,
    Json(request): Json<ValidateTokenRequest>,
) -> Result<Json<ValidateResponse>, AuthError> {
    let claims = state.auth.validate_token(&request.token).await?;

    Ok(Json(ValidateResponse {
        valid: true,
        merchant_id: Some(claims.merchant_id),
    }))
}

/// Validate an API key passed in the `X-API-Key` header.
///
/// # Endpoint
///
/// `POST /api/v1/auth/validate-api-key`
///
/// # Response
///
/// - **Success (200 OK)**: `{ "valid": true, "merchant_id": 1 }`
/// - **Error (401)**: `invalid_api_key` (missing, unknown, or inactive)
pub async fn validate_api_key(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ValidateResponse>, AuthError> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .ok_or(AuthError::InvalidApiKey)?;

    let merchant = state.auth.validate_api_key(api_key).await?;

    Ok(Json(ValidateResponse {
        valid: true,
        merchant_id: Some(merchant.id),
    }))
}
