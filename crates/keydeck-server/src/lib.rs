pub mod auth;
pub mod config;
mod routes;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use keydeck_db::Database;
use keydeck_service::LocalStore;
use tokio::net::TcpListener;

use auth::AuthConfig;

pub async fn serve(
    listener: TcpListener,
    db: Arc<dyn Database>,
    auth: Option<Arc<AuthConfig>>,
) -> Result<()> {
    let app = build_app(db, auth);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_app(db: Arc<dyn Database>, auth: Option<Arc<AuthConfig>>) -> axum::Router {
    let state = Arc::new(routes::InnerAppState {
        store: LocalStore::new(db),
        auth,
    });
    routes::build_router(state)
}
