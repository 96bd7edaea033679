//! HTTP client for an Azure-style chat-completions deployment.

use renewal_core::{TextServiceConfig, Timeouts};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const API_VERSION: &str = "2024-02-15-preview";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Client bound to one deployment. The credential travels in the `api-key` header.
pub struct ChatClient {
    client: reqwest::Client,
    url: String,
    credential: String,
}

impl ChatClient {
    pub fn new(config: TextServiceConfig, timeouts: &Timeouts) -> Result<Self, GenerateError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.text_service)
            .build()?;
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={API_VERSION}",
            config.endpoint.trim_end_matches('/'),
            config.deployment,
        );
        Ok(Self {
            client,
            url,
            credential: config.credential,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one chat request.
    ///
    /// `Ok(None)` means the service answered 2xx with JSON that carries no
    /// `choices[0].message.content` string.
    pub async fn complete(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, GenerateError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GenerateError::Cancelled),
            result = self.send(request) => result,
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<Option<String>, GenerateError> {
        debug!(url = %self.url, "requesting chat completion");
        let resp = self
            .client
            .post(&self.url)
            .header("api-key", &self.credential)
            .json(request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerateError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let value: Value = serde_json::from_str(&body)?;
        Ok(first_choice_content(&value).map(str::to_string))
    }
}

fn first_choice_content(value: &Value) -> Option<&str> {
    value
        .get("choices")?
        .as_array()?
        .first()?
        .pointer("/message/content")?
        .as_str()
}
