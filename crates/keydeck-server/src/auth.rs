use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::routes::AppState;

/// Service-key check for the store routes.
pub struct AuthConfig {
    /// SHA-256 hash of the configured service key.
    pub key_hash: String,
}

/// SHA-256 hash a raw key, returning the hex-encoded digest.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Axum middleware that enforces the service key.
///
/// If `auth` is `None` in the AppState, all requests pass through (open access).
/// Otherwise, requires `Authorization: Bearer <service key>`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let auth = match &state.auth {
        Some(auth) => auth,
        None => return next.run(request).await,
    };

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if let Some(token) = token {
        if constant_time_eq(&sha256_hex(token), &auth.key_hash) {
            return next.run(request).await;
        }
    }

    tracing::warn!(path = %request.uri().path(), "rejected request without valid service key");
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "missing or invalid service key" })),
    )
        .into_response()
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Build auth config from the configured key. Empty or absent means open access.
pub fn build_auth_config(service_key: Option<&str>) -> Option<Arc<AuthConfig>> {
    service_key.filter(|k| !k.is_empty()).map(|k| {
        Arc::new(AuthConfig {
            key_hash: sha256_hex(k),
        })
    })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::test_helpers::{test_router, test_router_with_auth};

    const KEYS_URI: &str = "/api/users/dev-local/keys";

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("hello", "hello"));
        assert!(!constant_time_eq("hello", "world"));
        assert!(!constant_time_eq("short", "longer-string"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn build_auth_config_open_when_unset_or_empty() {
        assert!(build_auth_config(None).is_none());
        assert!(build_auth_config(Some("")).is_none());
    }

    #[test]
    fn build_auth_config_hashes_key() {
        let auth = build_auth_config(Some("hello")).unwrap();
        assert_eq!(auth.key_hash, sha256_hex("hello"));
    }

    #[tokio::test]
    async fn no_config_passes_all() {
        let app = test_router();
        let resp = app
            .oneshot(Request::builder().uri(KEYS_URI).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn valid_bearer() {
        let (app, key) = test_router_with_auth();
        let resp = app
            .oneshot(
                Request::builder()
                    .uri(KEYS_URI)
                    .header("Authorization", format!("Bearer {key}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn invalid_bearer() {
        let (app, _key) = test_router_with_auth();
        let resp = app
            .oneshot(
                Request::builder()
                    .uri(KEYS_URI)
                    .header("Authorization", "Bearer wrong-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_header() {
        let (app, _key) = test_router_with_auth();
        let resp = app
            .oneshot(Request::builder().uri(KEYS_URI).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_needs_no_auth() {
        let (app, _key) = test_router_with_auth();
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
