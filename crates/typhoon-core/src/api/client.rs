use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use super::{ApiError, ChatBackend};
use crate::composer::SendRequest;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client for the `POST {base_url}/chat` endpoint.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat", self.base_url)
    }

    fn build_form(request: SendRequest) -> Result<Form, ApiError> {
        let mut form = Form::new().text("message", request.text);

        if let Some(file) = request.file {
            let part = Part::bytes(file.bytes)
                .file_name(file.name)
                .mime_str(&file.media_type)?;
            form = form.part("file", part);
        }

        Ok(form)
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn send(&self, request: SendRequest) -> Result<String, ApiError> {
        let url = self.endpoint();
        let has_file = request.file.is_some();
        let form = Self::build_form(request)?;

        tracing::debug!(%url, has_file, "posting chat turn");

        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        Ok(response.text().await?)
    }
}
