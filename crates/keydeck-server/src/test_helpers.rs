use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::auth::build_auth_config;

pub const TEST_SERVICE_KEY: &str = "test-service-key";

/// Build a test router with in-memory SQLite, no auth.
pub fn test_router() -> Router {
    let db = Arc::new(keydeck_db::SqliteDatabase::open_in_memory().unwrap());
    crate::build_app(db, None)
}

/// Build a test router with the service key enabled, returning (router, key).
pub fn test_router_with_auth() -> (Router, String) {
    let db = Arc::new(keydeck_db::SqliteDatabase::open_in_memory().unwrap());
    let router = crate::build_app(db, build_auth_config(Some(TEST_SERVICE_KEY)));
    (router, TEST_SERVICE_KEY.to_string())
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn an axum test server on a random port. Returns the TestServer
/// with the `base_url` (e.g. "http://127.0.0.1:12345").
pub async fn spawn_test_server() -> TestServer {
    spawn_router(test_router()).await
}

/// Same as `spawn_test_server`, but every key route requires `TEST_SERVICE_KEY`.
pub async fn spawn_test_server_with_auth() -> TestServer {
    let (router, _) = test_router_with_auth();
    spawn_router(router).await
}

async fn spawn_router(app: Router) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        _handle: handle,
    }
}
