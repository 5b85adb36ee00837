use std::sync::Arc;

use keydeck_core::api_key::generate_key_value;
use keydeck_core::{ApiKeyRecord, NewApiKey, SortOrder, UpdateApiKey, STATIC_USER_ID};

use crate::{KeyStore, ServiceError};

/// Notification texts shown to the user.
pub mod messages {
    pub const FETCH_FAILED: &str = "Failed to fetch API keys";
    pub const CREATED: &str = "API key created successfully";
    pub const CREATE_FAILED: &str = "Failed to create API key";
    pub const UPDATED: &str = "API key updated successfully";
    pub const UPDATE_FAILED: &str = "Failed to update API key";
    pub const REGENERATED: &str = "API key regenerated successfully";
    pub const REGENERATE_FAILED: &str = "Failed to regenerate API key";
    pub const DELETED: &str = "API key deleted successfully";
    pub const DELETE_FAILED: &str = "Failed to delete API key";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Receives one-line outcome messages from `KeyList`.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, message: &str);
}

impl<F> Notifier for F
where
    F: Fn(NoticeKind, &str) + Send + Sync,
{
    fn notify(&self, kind: NoticeKind, message: &str) {
        self(kind, message)
    }
}

/// In-memory view of one user's keys, kept in step with the store.
///
/// Every mutation goes to the store first; the local list only changes
/// once the store call succeeds. Failures leave the list as it was and
/// are reported through the notifier.
pub struct KeyList {
    store: Arc<dyn KeyStore>,
    notifier: Arc<dyn Notifier>,
    user_id: String,
    keys: Vec<ApiKeyRecord>,
    is_loading: bool,
}

impl KeyList {
    pub fn new(store: Arc<dyn KeyStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self::for_user(store, notifier, STATIC_USER_ID)
    }

    pub fn for_user(
        store: Arc<dyn KeyStore>,
        notifier: Arc<dyn Notifier>,
        user_id: &str,
    ) -> Self {
        Self {
            store,
            notifier,
            user_id: user_id.to_string(),
            keys: Vec::new(),
            is_loading: true,
        }
    }

    pub fn keys(&self) -> &[ApiKeyRecord] {
        &self.keys
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn find(&self, id: &str) -> Option<&ApiKeyRecord> {
        self.keys.iter().find(|k| k.id == id)
    }

    pub async fn fetch(&mut self, order: SortOrder) -> Result<(), ServiceError> {
        self.is_loading = true;
        let result = self.store.list_keys(&self.user_id, order).await;
        self.is_loading = false;

        match result {
            Ok(keys) => {
                tracing::debug!(count = keys.len(), %order, "fetched api keys");
                self.keys = keys;
                Ok(())
            }
            Err(e) => {
                tracing::error!("fetch api keys: {e}");
                self.notifier.notify(NoticeKind::Error, messages::FETCH_FAILED);
                Err(e)
            }
        }
    }

    pub async fn create(
        &mut self,
        name: &str,
        max_usage: i64,
    ) -> Result<ApiKeyRecord, ServiceError> {
        let input = NewApiKey::generate(name, max_usage);
        match self.store.insert_key(&self.user_id, &input).await {
            Ok(record) => {
                tracing::info!(id = %record.id, "created api key");
                self.keys.insert(0, record.clone());
                self.notifier.notify(NoticeKind::Success, messages::CREATED);
                Ok(record)
            }
            Err(e) => {
                tracing::error!("create api key: {e}");
                self.notifier.notify(NoticeKind::Error, messages::CREATE_FAILED);
                Err(e)
            }
        }
    }

    pub async fn update(&mut self, id: &str, update: &UpdateApiKey) -> Result<(), ServiceError> {
        self.apply_update(id, update, messages::UPDATED, messages::UPDATE_FAILED)
            .await
    }

    /// Replace the key's value with a freshly generated one.
    pub async fn regenerate(&mut self, id: &str) -> Result<String, ServiceError> {
        let value = generate_key_value();
        self.apply_update(
            id,
            &UpdateApiKey::replace_value(value.clone()),
            messages::REGENERATED,
            messages::REGENERATE_FAILED,
        )
        .await?;
        Ok(value)
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), ServiceError> {
        match self.store.delete_key(&self.user_id, id).await {
            Ok(()) => {
                tracing::info!(%id, "deleted api key");
                self.keys.retain(|k| k.id != id);
                self.notifier.notify(NoticeKind::Success, messages::DELETED);
                Ok(())
            }
            Err(e) => {
                tracing::error!(%id, "delete api key: {e}");
                self.notifier.notify(NoticeKind::Error, messages::DELETE_FAILED);
                Err(e)
            }
        }
    }

    async fn apply_update(
        &mut self,
        id: &str,
        update: &UpdateApiKey,
        ok_message: &str,
        err_message: &str,
    ) -> Result<(), ServiceError> {
        match self.store.update_key(&self.user_id, id, update).await {
            Ok(()) => {
                tracing::info!(%id, "updated api key");
                if let Some(key) = self.keys.iter_mut().find(|k| k.id == id) {
                    key.apply(update);
                }
                self.notifier.notify(NoticeKind::Success, ok_message);
                Ok(())
            }
            Err(e) => {
                tracing::error!(%id, "update api key: {e}");
                self.notifier.notify(NoticeKind::Error, err_message);
                Err(e)
            }
        }
    }
}
