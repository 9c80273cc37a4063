use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use shared::{
    domain::ContentId,
    error::ApiErrorBody,
    protocol::{SearchParams, WireEvent, WirePage, WritePayload},
};
use tracing::debug;

use crate::{config::ClientSettings, error::TransportError};

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Request contract of the events backend.
#[async_trait]
pub trait ContentTransport: Send + Sync {
    async fn search(&self, params: &SearchParams) -> Result<WirePage>;
    async fn list_all(&self) -> Result<Vec<WireEvent>>;
    async fn get_item(&self, id: ContentId) -> Result<WireEvent>;
    async fn create_item(&self, payload: &WritePayload) -> Result<WireEvent>;
    async fn update_item(&self, id: ContentId, payload: &WritePayload) -> Result<WireEvent>;
    async fn delete_item(&self, id: ContentId) -> Result<()>;
    async fn upload_image(&self, id: ContentId, upload: ImageUpload) -> Result<WireEvent>;
}

pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn events_url(&self) -> String {
        format!("{}/events", self.base_url)
    }

    fn event_url(&self, id: ContentId) -> String {
        format!("{}/events/{}", self.base_url, id.0)
    }
}

/// Turns non-2xx responses into [`TransportError::Status`], preferring the
/// backend's own error message over the bare status text.
async fn ensure_success(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.best_message().map(str::to_string))
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "request failed".to_string());

    Err(TransportError::Status { status, message }.into())
}

#[async_trait]
impl ContentTransport for HttpTransport {
    async fn search(&self, params: &SearchParams) -> Result<WirePage> {
        debug!(page = params.page, size = params.size, sort = %params.sort, "transport: search");
        let res = self
            .http
            .get(format!("{}/events/search", self.base_url))
            .query(params)
            .send()
            .await?;
        Ok(ensure_success(res).await?.json().await?)
    }

    async fn list_all(&self) -> Result<Vec<WireEvent>> {
        let res = self.http.get(self.events_url()).send().await?;
        Ok(ensure_success(res).await?.json().await?)
    }

    async fn get_item(&self, id: ContentId) -> Result<WireEvent> {
        let res = self.http.get(self.event_url(id)).send().await?;
        Ok(ensure_success(res).await?.json().await?)
    }

    async fn create_item(&self, payload: &WritePayload) -> Result<WireEvent> {
        let res = self.http.post(self.events_url()).json(payload).send().await?;
        Ok(ensure_success(res).await?.json().await?)
    }

    async fn update_item(&self, id: ContentId, payload: &WritePayload) -> Result<WireEvent> {
        let res = self.http.put(self.event_url(id)).json(payload).send().await?;
        Ok(ensure_success(res).await?.json().await?)
    }

    async fn delete_item(&self, id: ContentId) -> Result<()> {
        let res = self.http.delete(self.event_url(id)).send().await?;
        ensure_success(res).await?;
        Ok(())
    }

    async fn upload_image(&self, id: ContentId, upload: ImageUpload) -> Result<WireEvent> {
        let mut part = multipart::Part::bytes(upload.bytes).file_name(upload.filename);
        if let Some(mime_type) = upload.mime_type.as_deref() {
            part = part
                .mime_str(mime_type)
                .with_context(|| format!("invalid mime type '{mime_type}'"))?;
        }
        let form = multipart::Form::new().part("file", part);

        let res = self
            .http
            .post(format!("{}/image", self.event_url(id)))
            .multipart(form)
            .send()
            .await?;
        Ok(ensure_success(res).await?.json().await?)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
