use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use keydeck_core::{NewApiKey, SortOrder, UpdateApiKey};
use keydeck_service::{KeyStore, ServiceError};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;

type ApiError = (StatusCode, Json<Value>);

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/{user_id}/keys", get(list_keys).post(create_key))
        .route(
            "/api/users/{user_id}/keys/{id}",
            patch(update_key).delete(delete_key),
        )
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    order: Option<String>,
}

async fn list_keys(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let order = match query.order.as_deref() {
        Some(raw) => SortOrder::parse(raw)
            .map_err(|e| to_error(ServiceError::InvalidInput(e.to_string())))?,
        None => SortOrder::default(),
    };
    state
        .store
        .list_keys(&user_id, order)
        .await
        .map(|keys| Json(json!(keys)))
        .map_err(to_error)
}

async fn create_key(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(input): Json<NewApiKey>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    check_new_key(&input).map_err(to_error)?;
    state
        .store
        .insert_key(&user_id, &input)
        .await
        .map(|key| (StatusCode::CREATED, Json(json!(key))))
        .map_err(to_error)
}

async fn update_key(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
    Json(update): Json<UpdateApiKey>,
) -> Result<StatusCode, ApiError> {
    if let Some(ref name) = update.name {
        if name.trim().is_empty() {
            return Err(to_error(ServiceError::InvalidInput(
                "name must not be empty".into(),
            )));
        }
    }
    state
        .store
        .update_key(&user_id, &id, &update)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

async fn delete_key(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_key(&user_id, &id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

fn check_new_key(input: &NewApiKey) -> Result<(), ServiceError> {
    if input.name.trim().is_empty() {
        return Err(ServiceError::InvalidInput("name must not be empty".into()));
    }
    if input.value.is_empty() {
        return Err(ServiceError::InvalidInput("value must not be empty".into()));
    }
    if input.usage_count < 0 {
        return Err(ServiceError::InvalidInput(
            "usage_count must not be negative".into(),
        ));
    }
    Ok(())
}

fn to_error(e: ServiceError) -> ApiError {
    let status = match &e {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ServiceError::Internal(_) => {
            tracing::error!("store failure: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": e.to_string() })))
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use keydeck_core::ApiKeyRecord;
    use tower::ServiceExt;

    use super::*;
    use crate::test_helpers::test_router;

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_key(name: &str) -> Request<Body> {
        let body = serde_json::to_string(&NewApiKey::generate(name, 10)).unwrap();
        Request::builder()
            .method("POST")
            .uri("/api/users/dev-local/keys")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn create_returns_created_record() {
        let app = test_router();
        let resp = app.oneshot(post_key("Test")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let value: Value = body_json(resp).await;
        assert_eq!(value["name"], "Test");
        assert_eq!(value["usage_count"], 0);
        assert_eq!(value["max_usage"], 10);
        assert!(value["createdAt"].is_string());
        assert!(value["value"].as_str().unwrap().starts_with("key_"));
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let app = test_router();
        let resp = app.oneshot(post_key("   ")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_rejects_unknown_order() {
        let app = test_router();
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/users/dev-local/keys?order=sideways")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let value: Value = body_json(resp).await;
        assert!(value["error"].as_str().unwrap().contains("sideways"));
    }

    #[tokio::test]
    async fn list_defaults_to_empty_array() {
        let app = test_router();
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/users/dev-local/keys")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let keys: Vec<ApiKeyRecord> = body_json(resp).await;
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn patch_and_delete_missing_are_404() {
        let app = test_router();
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/api/users/dev-local/keys/missing")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/users/dev-local/keys/missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patch_rejects_blank_name() {
        let app = test_router();
        let resp = app.clone().oneshot(post_key("Keep")).await.unwrap();
        let created: ApiKeyRecord = body_json(resp).await;

        let resp = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(format!("/api/users/dev-local/keys/{}", created.id))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
