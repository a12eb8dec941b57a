//! HTTP surface tests driven through the router with `oneshot`.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use merchant_auth_service::{
    AppState, AuthService,
    auth::{PasswordHasher, TokenManager},
    build_router,
    metrics::AuthMetrics,
    store::InMemoryMerchantStore,
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let auth = AuthService::new(
        Arc::new(InMemoryMerchantStore::new()),
        TokenManager::new(b"api-test-secret".as_slice(), Duration::hours(24)),
        PasswordHasher::new(4).unwrap(),
        AuthMetrics::new(),
    );
    build_router(AppState::new(auth))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_bearer(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn api_key_check(api_key: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/auth/validate-api-key")
        .header("X-API-Key", api_key)
        .body(Body::empty())
        .unwrap()
}

async fn register_and_login(app: &Router) -> (Value, String) {
    let (status, merchant) = send(
        app,
        post_json(
            "/api/v1/auth/register",
            json!({
                "company_name": "Acme Corp",
                "email": "acme@example.com",
                "password": "password123"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, login) = send(
        app,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": "acme@example.com", "password": "password123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    (merchant, login["token"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_register_response_shape() {
    let app = app();
    let (merchant, _) = register_and_login(&app).await;

    assert_eq!(merchant["company_name"], "Acme Corp");
    assert_eq!(merchant["email"], "acme@example.com");
    assert_eq!(merchant["active"], true);
    assert!(merchant["api_key"].as_str().unwrap().starts_with("pk_"));
    assert!(merchant.get("password_hash").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = app();
    register_and_login(&app).await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/register",
            json!({
                "company_name": "Someone Else",
                "email": "ACME@example.com",
                "password": "password123"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "duplicate_email");
}

#[tokio::test]
async fn test_invalid_registration_is_bad_request() {
    let app = app();
    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/register",
            json!({ "company_name": "Acme", "email": "acme@example.com", "password": "short" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn test_login_failure_is_unauthorized() {
    let app = app();
    register_and_login(&app).await;

    let (status, wrong_password) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": "acme@example.com", "password": "nope-nope-nope" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": "ghost@example.com", "password": "password123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown);
}

#[tokio::test]
async fn test_validate_endpoints() {
    let app = app();
    let (merchant, token) = register_and_login(&app).await;
    let merchant_id = merchant["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        post_json("/api/v1/auth/validate", json!({ "token": token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "valid": true, "merchant_id": merchant_id }));

    let (status, body) = send(
        &app,
        post_json("/api/v1/auth/validate", json!({ "token": "a.b.c" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "malformed_token");

    let (status, body) = send(&app, api_key_check(merchant["api_key"].as_str().unwrap())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["merchant_id"], merchant_id);

    let (status, body) = send(
        &app,
        api_key_check("pk_00000000-0000-4000-8000-000000000000"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "invalid_api_key");
}

#[tokio::test]
async fn test_missing_api_key_header() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/validate-api-key")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "invalid_api_key");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app();
    let request = Request::builder()
        .uri("/api/v1/merchants/me")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "malformed_token");
}

#[tokio::test]
async fn test_non_bearer_authorization_is_malformed_token() {
    let app = app();
    let (_, token) = register_and_login(&app).await;

    for value in [format!("Basic {token}"), format!("bearer {token}"), "Bearer ".to_string()] {
        let request = Request::builder()
            .uri("/api/v1/merchants/me")
            .header(header::AUTHORIZATION, value.as_str())
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{value}");
        assert_eq!(body["error"]["code"], "malformed_token", "{value}");
    }
}

#[tokio::test]
async fn test_me_rotate_and_deactivate() {
    let app = app();
    let (merchant, token) = register_and_login(&app).await;
    let old_key = merchant["api_key"].as_str().unwrap().to_string();

    let (status, me) = send(&app, with_bearer("GET", "/api/v1/merchants/me", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], merchant["id"]);

    let (status, rotated) = send(
        &app,
        with_bearer("POST", "/api/v1/merchants/me/api-key", &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_key = rotated["api_key"].as_str().unwrap().to_string();
    assert_ne!(new_key, old_key);

    let (status, _) = send(&app, api_key_check(&old_key)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, api_key_check(&new_key)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, with_bearer("DELETE", "/api/v1/merchants/me", &token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, with_bearer("GET", "/api/v1/merchants/me", &token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "merchant_inactive");

    let (status, _) = send(&app, api_key_check(&new_key)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let app = app();
    register_and_login(&app).await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["merchants_registered"], 1);
    assert_eq!(body["logins_succeeded"], 1);
    assert_eq!(body["tokens_issued"], 1);
}
