use async_trait::async_trait;
use keydeck_core::{ApiKeyRecord, NewApiKey, SortOrder, UpdateApiKey};
use reqwest::{Client, RequestBuilder, StatusCode};

use crate::{KeyStore, ServiceError};

/// Async HTTP client implementation of KeyStore.
/// Connects to a running keydeck-server.
#[derive(Clone)]
pub struct HttpStore {
    base_url: String,
    client: Client,
    service_key: Option<String>,
}

impl HttpStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            service_key: None,
        }
    }

    pub fn with_service_key(base_url: &str, key: String) -> Self {
        Self {
            service_key: Some(key),
            ..Self::new(base_url)
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.service_key {
            Some(key) => builder.header("Authorization", format!("Bearer {key}")),
            None => builder,
        }
    }

    fn keys_url(&self, user_id: &str) -> String {
        format!("{}/api/users/{user_id}/keys", self.base_url)
    }

    fn key_url(&self, user_id: &str, id: &str) -> String {
        format!("{}/api/users/{user_id}/keys/{id}", self.base_url)
    }

    /// Check if the server is reachable.
    /// Health endpoint is NOT authenticated.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        let resp = self
            .client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Internal(format!("connection failed: {e}")))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ServiceError::Internal(format!(
                "health check failed: {}",
                resp.status()
            )))
        }
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ServiceError> {
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        handle_response(resp).await
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ServiceError> {
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(parse_error(resp).await)
        }
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| ServiceError::Internal(format!("json decode: {e}")))
    } else {
        Err(parse_error_with_status(status, resp).await)
    }
}

async fn parse_error(resp: reqwest::Response) -> ServiceError {
    let status = resp.status();
    parse_error_with_status(status, resp).await
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> ServiceError {
    let body = resp.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or(body);

    match status {
        StatusCode::NOT_FOUND => ServiceError::NotFound(msg),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ServiceError::InvalidInput(msg)
        }
        StatusCode::UNAUTHORIZED => ServiceError::Unauthorized(msg),
        _ => ServiceError::Internal(msg),
    }
}

#[async_trait]
impl KeyStore for HttpStore {
    async fn list_keys(
        &self,
        user_id: &str,
        order: SortOrder,
    ) -> Result<Vec<ApiKeyRecord>, ServiceError> {
        let builder = self
            .client
            .get(self.keys_url(user_id))
            .query(&[("order", order.as_str())]);
        self.send_json(builder).await
    }

    async fn insert_key(
        &self,
        user_id: &str,
        input: &NewApiKey,
    ) -> Result<ApiKeyRecord, ServiceError> {
        let builder = self.client.post(self.keys_url(user_id)).json(input);
        self.send_json(builder).await
    }

    async fn update_key(
        &self,
        user_id: &str,
        id: &str,
        update: &UpdateApiKey,
    ) -> Result<(), ServiceError> {
        let builder = self.client.patch(self.key_url(user_id, id)).json(update);
        self.send_empty(builder).await
    }

    async fn delete_key(&self, user_id: &str, id: &str) -> Result<(), ServiceError> {
        let builder = self.client.delete(self.key_url(user_id, id));
        self.send_empty(builder).await
    }
}
