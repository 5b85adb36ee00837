use std::sync::Arc;

use async_trait::async_trait;
use keydeck_core::{ApiKeyRecord, NewApiKey, SortOrder, UpdateApiKey};
use keydeck_db::{Database, DbError};

use crate::{KeyStore, ServiceError};

/// Store client backed by a direct database handle.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<dyn Database>,
}

impl LocalStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => ServiceError::NotFound(msg),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

#[async_trait]
impl KeyStore for LocalStore {
    async fn list_keys(
        &self,
        user_id: &str,
        order: SortOrder,
    ) -> Result<Vec<ApiKeyRecord>, ServiceError> {
        Ok(self.db.list_api_keys(user_id, order).await?)
    }

    async fn insert_key(
        &self,
        user_id: &str,
        input: &NewApiKey,
    ) -> Result<ApiKeyRecord, ServiceError> {
        Ok(self.db.insert_api_key(user_id, input).await?)
    }

    async fn update_key(
        &self,
        user_id: &str,
        id: &str,
        update: &UpdateApiKey,
    ) -> Result<(), ServiceError> {
        Ok(self.db.update_api_key(user_id, id, update).await?)
    }

    async fn delete_key(&self, user_id: &str, id: &str) -> Result<(), ServiceError> {
        Ok(self.db.delete_api_key(user_id, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> LocalStore {
        LocalStore::new(Arc::new(
            keydeck_db::SqliteDatabase::open_in_memory().unwrap(),
        ))
    }

    #[tokio::test]
    async fn maps_not_found() {
        let store = make_store();
        let err = store.delete_key("dev-local", "missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn round_trips_through_db() {
        let store = make_store();
        let key = store
            .insert_key("dev-local", &NewApiKey::generate("Local", 3))
            .await
            .unwrap();
        let listed = store.list_keys("dev-local", SortOrder::Asc).await.unwrap();
        assert_eq!(listed, vec![key]);
    }
}
