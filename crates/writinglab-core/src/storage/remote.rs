//! HTTP document store gateway.
//!
//! Records are stored as JSON documents at `{remote_url}/{collection}/{id}`:
//! `PUT` replaces the document, `GET` reads it back and `404` means absent.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use url::Url;

use super::config::StorageConfig;
use super::gateway::PersistenceGateway;
use crate::error::{ConfigError, CoreError, PersistError};
use crate::ids::SessionId;
use crate::session::SessionRecord;

pub struct RemoteStore {
    base: Url,
    collection: String,
    api_key: Option<String>,
    client: Client,
    runtime: tokio::runtime::Runtime,
}

impl RemoteStore {
    /// Build a store from the `[storage]` config section.
    ///
    /// # Errors
    /// Returns an error if `remote_url` is not an absolute http(s) URL or the
    /// HTTP client cannot be built.
    pub fn new(config: &StorageConfig) -> Result<Self, CoreError> {
        let invalid_url = |message: String| ConfigError::InvalidValue {
            key: "storage.remote_url".to_string(),
            message,
        };

        let base = Url::parse(config.remote_url.trim()).map_err(|e| invalid_url(e.to_string()))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(invalid_url(format!("'{base}' is not an http(s) base URL")).into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(PersistError::from)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            base,
            collection: config.collection.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            client,
            runtime,
        })
    }

    /// Document URL for `id`. Segments are percent-encoded.
    pub fn document_url(&self, id: &SessionId) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&self.collection)
                .push(id.as_str());
        }
        url
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

async fn error_for_status(resp: reqwest::Response) -> Result<reqwest::Response, PersistError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(PersistError::Remote {
        status: status.as_u16(),
        body,
    })
}

impl RemoteStore {
    async fn put(&self, url: Url, record: &SessionRecord) -> Result<(), PersistError> {
        let resp = self
            .request(reqwest::Method::PUT, url)
            .json(record)
            .send()
            .await?;
        error_for_status(resp).await?;
        Ok(())
    }

    async fn get(&self, url: Url) -> Result<Option<SessionRecord>, PersistError> {
        let resp = self.request(reqwest::Method::GET, url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = error_for_status(resp).await?;
        let text = resp.text().await?;
        Ok(Some(SessionRecord::from_json(&text)?))
    }
}

impl PersistenceGateway for RemoteStore {
    fn name(&self) -> &str {
        "remote"
    }

    fn save(&self, id: &SessionId, record: &SessionRecord) -> Result<(), PersistError> {
        let url = self.document_url(id);
        tracing::debug!(%url, "saving session document");
        self.runtime.block_on(self.put(url, record))
    }

    fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, PersistError> {
        let url = self.document_url(id);
        tracing::debug!(%url, "loading session document");
        self.runtime.block_on(self.get(url))
    }
}
