//! Anthropic API client implementation

use crate::{
    error::ClaudeError,
    messages::{MessagesRequest, MessagesResponse, StreamEvent},
};
use async_stream::stream;
use futures::stream::Stream;
use reqwest::{Client, Response, StatusCode};
use std::pin::Pin;
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1";

const API_VERSION: &str = "2023-06-01";

/// Stream of SSE events from the Messages API
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ClaudeError>> + Send>>;

/// Anthropic API client
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    api_url: String,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    /// Create a new client with API key from environment
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::MissingApiKey` if `ANTHROPIC_API_KEY` is not set
    pub fn from_env() -> Result<Self, ClaudeError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ClaudeError::MissingApiKey)?;

        Self::builder(api_key).build()
    }

    /// Start configuring a client
    #[must_use]
    pub fn builder(api_key: impl Into<String>) -> AnthropicClientBuilder {
        AnthropicClientBuilder {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: None,
        }
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn post(&self, request: &MessagesRequest) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/messages", self.api_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(request)
    }

    /// Create messages (non-streaming)
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, timeouts, API errors, or parsing
    /// failures
    pub async fn messages(&self, request: MessagesRequest) -> Result<MessagesResponse, ClaudeError> {
        let mut builder = self.post(&request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| ClaudeError::from_reqwest(&e))?;

        check_status(response)
            .await?
            .json::<MessagesResponse>()
            .await
            .map_err(|e| ClaudeError::ResponseParseFailed(e.to_string()))
    }

    /// Create messages (streaming)
    ///
    /// Returns a stream of `StreamEvent` items. The stream yields events as they
    /// arrive from the API. Dropping the stream closes the connection.
    ///
    /// The configured timeout bounds connection setup only; idle time between
    /// events is the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or API errors. Individual stream items
    /// may also contain errors if event parsing fails or the API reports an
    /// error mid-stream.
    pub async fn messages_stream(&self, request: MessagesRequest) -> Result<EventStream, ClaudeError> {
        let request = request.with_streaming();
        let send = self.post(&request).send();
        let response = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, send)
                .await
                .map_err(|_| ClaudeError::Timeout)?,
            None => send.await,
        }
        .map_err(|e| ClaudeError::from_reqwest(&e))?;

        let byte_stream = check_status(response).await?.bytes_stream();

        Ok(Box::pin(stream! {
            let mut buffer: Vec<u8> = Vec::new();

            for await chunk in byte_stream {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(ClaudeError::StreamFailed(e.to_string()));
                        return;
                    }
                };
                buffer.extend_from_slice(&bytes);

                // SSE frames are line-oriented; only `data:` lines carry events
                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);
                    let Some(data) = line.trim().strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim_start();
                    if data == "[DONE]" {
                        return;
                    }

                    match serde_json::from_str::<StreamEvent>(data) {
                        Ok(StreamEvent::Error { error }) => {
                            tracing::debug!(kind = %error.kind, "Error event in Messages stream");
                            yield Err(stream_error(&error.kind, error.message));
                            return;
                        }
                        Ok(event) => yield Ok(event),
                        Err(e) => {
                            yield Err(ClaudeError::ResponseParseFailed(e.to_string()));
                            return;
                        }
                    }
                }
            }
        }))
    }
}

async fn check_status(response: Response) -> Result<Response, ClaudeError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::TOO_MANY_REQUESTS => Err(ClaudeError::RateLimited),
        StatusCode::UNAUTHORIZED => Err(ClaudeError::Unauthorized),
        status => {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %body, "Messages API error response");
            Err(ClaudeError::ApiError {
                status: status.as_u16(),
                message: body,
            })
        }
    }
}

fn stream_error(kind: &str, message: String) -> ClaudeError {
    match kind {
        "rate_limit_error" => ClaudeError::RateLimited,
        "authentication_error" => ClaudeError::Unauthorized,
        _ => ClaudeError::StreamFailed(format!("{kind}: {message}")),
    }
}

/// Builder for [`AnthropicClient`]
#[derive(Debug)]
pub struct AnthropicClientBuilder {
    api_key: String,
    api_url: String,
    timeout: Option<Duration>,
}

impl AnthropicClientBuilder {
    /// Override the API base URL (without the `/messages` suffix)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound each non-streaming request and each stream's connection setup
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::MissingApiKey` for a blank key and
    /// `ClaudeError::ClientSetup` if the HTTP client cannot be created
    pub fn build(self) -> Result<AnthropicClient, ClaudeError> {
        if self.api_key.trim().is_empty() {
            return Err(ClaudeError::MissingApiKey);
        }
        let mut http = Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.connect_timeout(timeout);
        }
        let client = http
            .build()
            .map_err(|e| ClaudeError::ClientSetup(e.to_string()))?;

        Ok(AnthropicClient {
            client,
            api_key: self.api_key,
            api_url: self.api_url,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = AnthropicClient::builder("test-key").build().unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.api_url(), DEFAULT_API_URL);
        assert_eq!(client.timeout, None);
    }

    #[test]
    fn test_builder_overrides() {
        let client = AnthropicClient::builder("test-key")
            .base_url("http://localhost:8080/v1/")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(client.api_url(), "http://localhost:8080/v1");
        assert_eq!(client.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_blank_key_rejected() {
        let err = AnthropicClient::builder("  ").build().unwrap_err();
        assert!(matches!(err, ClaudeError::MissingApiKey));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = AnthropicClient::builder("sk-secret").build().unwrap();
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("sk-secret"));
    }

    #[test]
    fn test_stream_error_mapping() {
        assert!(matches!(
            stream_error("rate_limit_error", String::new()),
            ClaudeError::RateLimited
        ));
        assert!(matches!(
            stream_error("overloaded_error", "Overloaded".to_string()),
            ClaudeError::StreamFailed(ref m) if m.contains("Overloaded")
        ));
    }
}
