use async_trait::async_trait;
use keydeck_core::{ApiKeyRecord, NewApiKey, SortOrder, UpdateApiKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Client for the record store.
///
/// The dashboard and the store service program against this trait.
/// `LocalStore` talks to a database directly.
/// `HttpStore` talks to a running keydeck-server.
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn list_keys(
        &self,
        user_id: &str,
        order: SortOrder,
    ) -> Result<Vec<ApiKeyRecord>, ServiceError>;
    async fn insert_key(
        &self,
        user_id: &str,
        input: &NewApiKey,
    ) -> Result<ApiKeyRecord, ServiceError>;
    async fn update_key(
        &self,
        user_id: &str,
        id: &str,
        update: &UpdateApiKey,
    ) -> Result<(), ServiceError>;
    async fn delete_key(&self, user_id: &str, id: &str) -> Result<(), ServiceError>;
}
