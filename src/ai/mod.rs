//! OpenAI-compatible chat completion client for the writing assistant.
//!
//! Runs over its own `reqwest` client rather than the shared transport: the
//! endpoint is a third-party service with its own key, and streaming needs
//! the raw byte stream instead of a buffered response. Failures are returned
//! to the caller without touching the alert dialog.

pub mod sse;

pub use sse::{SseAccumulator, StreamEvent};

use std::time::Duration;

use futures::StreamExt;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::client::{AdminClient, ClientResult};

/// Completion budget used when the config does not set one.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

// Streams run long; only connection setup is bounded.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI features are disabled or missing an API key")]
    Disabled,
    #[error("AI configuration is incomplete, endpoint and model are required")]
    Incomplete,
    #[error("AI request failed with status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed AI response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The `ai` section of the client config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiConfig {
    pub enabled: bool,
    pub api_key: String,
    /// Provider base URL, with or without the `/chat/completions` suffix.
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            endpoint: String::new(),
            model: String::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// One chat turn in provider wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    max_tokens: u32,
}

pub struct AiClient {
    config: AiConfig,
    http: reqwest::Client,
}

impl AiClient {
    pub fn new(config: AiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|error| AiError::Network(error.to_string()))?;
        Ok(Self { config, http })
    }

    /// Wraps an existing reqwest client, mainly for tests.
    pub fn from_client(config: AiConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Lists the models the provider offers. Only the key and endpoint are
    /// required, so a half-finished config can still be probed.
    pub async fn models(&self) -> Result<Value, AiError> {
        if self.config.api_key.is_empty() || self.config.endpoint.is_empty() {
            return Err(AiError::Incomplete);
        }

        let url = format!("{}/models", self.config.endpoint.trim_end_matches('/'));
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|error| AiError::Network(error.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|error| AiError::Network(error.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Sends a conversation and returns the complete answer.
    pub async fn send(&self, messages: &[ChatMessage]) -> Result<String, AiError> {
        self.ensure_ready()?;
        let response = self.post_chat(messages, false).await?;

        let body = response
            .text()
            .await
            .map_err(|error| AiError::Network(error.to_string()))?;
        let payload: Value = serde_json::from_str(&body)?;
        Ok(payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// Sends a conversation and surfaces deltas through `on_event` as they
    /// arrive. Returns the accumulated answer; reasoning fragments are
    /// forwarded but not accumulated.
    pub async fn send_streaming<F>(
        &self,
        messages: &[ChatMessage],
        mut on_event: F,
    ) -> Result<String, AiError>
    where
        F: FnMut(StreamEvent),
    {
        self.ensure_ready()?;
        let response = self.post_chat(messages, true).await?;

        let mut sse = SseAccumulator::new();
        let mut answer = String::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|error| AiError::Network(error.to_string()))?;
            for event in sse.push(&chunk) {
                if let StreamEvent::Content(content) = &event {
                    answer.push_str(content);
                }
                on_event(event);
            }
        }
        for event in sse.finish() {
            if let StreamEvent::Content(content) = &event {
                answer.push_str(content);
            }
            on_event(event);
        }

        on_event(StreamEvent::Done);
        Ok(answer)
    }

    fn ensure_ready(&self) -> Result<(), AiError> {
        if !self.config.enabled || self.config.api_key.is_empty() {
            return Err(AiError::Disabled);
        }
        if self.config.endpoint.is_empty() || self.config.model.is_empty() {
            return Err(AiError::Incomplete);
        }
        Ok(())
    }

    fn chat_endpoint(&self) -> String {
        let endpoint = self.config.endpoint.trim_end_matches('/');
        if endpoint.ends_with("/chat/completions") {
            endpoint.to_string()
        } else {
            format!("{endpoint}/chat/completions")
        }
    }

    async fn post_chat(
        &self,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<reqwest::Response, AiError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            stream,
            max_tokens: self.config.max_tokens,
        };

        debug!("requesting chat completion, stream={stream}");
        let response = self
            .http
            .post(self.chat_endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|error| AiError::Network(error.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(response)
    }

    async fn api_error(response: reqwest::Response) -> AiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        AiError::Api { status, body }
    }
}

impl AdminClient {
    /// Builds an AI client from the `ai` section of the loaded config.
    pub fn ai(&self) -> ClientResult<AiClient> {
        let config = self.config().ai.clone().ok_or(AiError::Disabled)?;
        Ok(AiClient::new(config)?)
    }
}
