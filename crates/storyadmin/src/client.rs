//! Typed HTTP client for the admin API.

use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::{CommitRequest, CommitResponse, ErrorBody, HealthResponse, SaveResponse, UploadResponse};
use crate::assets::UploadedAsset;
use crate::error::{AdminError, ClientError};
use crate::session::ConfigBackend;

type Result<T> = std::result::Result<T, ClientError>;

/// Talks to a running admin server, e.g. `http://localhost:3001`.
#[derive(Clone)]
pub struct AdminClient {
    client: reqwest::Client,
    base_url: String,
}

impl AdminClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_config(&self) -> Result<Value> {
        let response = self.client.get(self.url("/api/config")).send().await?;
        parse_response(response).await
    }

    pub async fn save_config(&self, document: &Value) -> Result<SaveResponse> {
        let response = self
            .client
            .post(self.url("/api/config"))
            .json(document)
            .send()
            .await?;
        parse_response(response).await
    }

    /// Uploads an image. `category` (`avatar`, `place`, `type`) decides where
    /// the file lands when published.
    pub async fn upload(
        &self,
        content: Vec<u8>,
        filename: &str,
        category: Option<&str>,
    ) -> Result<UploadedAsset> {
        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        let part = multipart::Part::bytes(content)
            .file_name(filename.to_string())
            .mime_str(mime.as_ref())?;

        let mut form = multipart::Form::new().part("file", part);
        if let Some(category) = category {
            form = form.text("category", category.to_string());
        }

        let response = self
            .client
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await?;
        let body: UploadResponse = parse_response(response).await?;

        Ok(UploadedAsset {
            stored_filename: body.filename,
            original_filename: body.original_name,
            served_url: body.url,
        })
    }

    /// Publishes the persisted configuration and uploads.
    pub async fn commit(&self, message: Option<&str>) -> Result<CommitResponse> {
        let request = CommitRequest {
            message: message.map(str::to_string),
        };
        let response = self
            .client
            .post(self.url("/api/commit"))
            .json(&request)
            .send()
            .await?;
        parse_response(response).await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self.client.get(self.url("/api/health")).send().await?;
        parse_response(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Decodes a 2xx body, or turns the server's `{error}` body into
/// [`ClientError::Api`].
async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            if text.trim().is_empty() {
                status.to_string()
            } else {
                text
            }
        });

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ConfigBackend for AdminClient {
    async fn fetch_config(&self) -> std::result::Result<Value, AdminError> {
        Ok(AdminClient::fetch_config(self).await?)
    }

    async fn save_config(&self, document: &Value) -> std::result::Result<(), AdminError> {
        AdminClient::save_config(self, document).await?;
        Ok(())
    }
}
