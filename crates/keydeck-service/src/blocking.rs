use std::sync::Arc;

use keydeck_core::{ApiKeyRecord, SortOrder, UpdateApiKey};
use tokio::runtime::Runtime;

use crate::{HttpStore, KeyList, KeyStore, Notifier, ServiceError};

/// Blocking wrapper around `KeyList`.
///
/// Owns a tokio runtime and uses `block_on()` for each call.
/// Designed for sync callers like the TUI.
pub struct BlockingKeyList {
    inner: KeyList,
    http: Option<HttpStore>,
    rt: Runtime,
}

impl BlockingKeyList {
    pub fn new(store: Arc<dyn KeyStore>, notifier: Arc<dyn Notifier>) -> Result<Self, ServiceError> {
        Ok(Self {
            inner: KeyList::new(store, notifier),
            http: None,
            rt: new_runtime()?,
        })
    }

    /// Talk to a keydeck-server at `base_url`.
    pub fn connect(
        base_url: &str,
        service_key: Option<String>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ServiceError> {
        let http = match service_key {
            Some(key) => HttpStore::with_service_key(base_url, key),
            None => HttpStore::new(base_url),
        };
        Ok(Self {
            inner: KeyList::new(Arc::new(http.clone()), notifier),
            http: Some(http),
            rt: new_runtime()?,
        })
    }

    /// Always succeeds for a store that is not behind HTTP.
    pub fn health_check(&self) -> Result<(), ServiceError> {
        match &self.http {
            Some(http) => self.rt.block_on(http.health_check()),
            None => Ok(()),
        }
    }

    pub fn keys(&self) -> &[ApiKeyRecord] {
        self.inner.keys()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.is_loading()
    }

    pub fn find(&self, id: &str) -> Option<&ApiKeyRecord> {
        self.inner.find(id)
    }

    pub fn fetch(&mut self, order: SortOrder) -> Result<(), ServiceError> {
        self.rt.block_on(self.inner.fetch(order))
    }

    pub fn create(&mut self, name: &str, max_usage: i64) -> Result<ApiKeyRecord, ServiceError> {
        self.rt.block_on(self.inner.create(name, max_usage))
    }

    pub fn update(&mut self, id: &str, update: &UpdateApiKey) -> Result<(), ServiceError> {
        self.rt.block_on(self.inner.update(id, update))
    }

    pub fn regenerate(&mut self, id: &str) -> Result<String, ServiceError> {
        self.rt.block_on(self.inner.regenerate(id))
    }

    pub fn delete(&mut self, id: &str) -> Result<(), ServiceError> {
        self.rt.block_on(self.inner.delete(id))
    }
}

fn new_runtime() -> Result<Runtime, ServiceError> {
    Runtime::new().map_err(|e| ServiceError::Internal(format!("tokio runtime: {e}")))
}
