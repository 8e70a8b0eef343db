//! The generation collaborator contract
//!
//! A [`Generator`] turns a rendered prompt into text. Whether it calls a
//! remote model, runs a tool-calling sub-loop or replays a script is its own
//! business; steps only see [`Generator::generate`] and
//! [`Generator::generate_stream`].

use crate::error::GenerationError;
use crate::session::SessionScope;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Response-format hint passed to the collaborator
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Free text
    #[default]
    Text,
    /// A single JSON object
    Json,
}

/// Per-call generation options
///
/// Unset fields fall back to the collaborator's own defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Response-format hint
    pub response_format: ResponseFormat,
    /// System prompt (persona, role, goal)
    pub system: Option<String>,
    /// Session scope forwarded to the collaborator
    pub session: Option<SessionScope>,
}

impl GenerationOptions {
    /// Builder: set model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builder: set temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Builder: set response format
    #[must_use]
    pub const fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }

    /// Builder: set system prompt
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Builder: set session scope
    #[must_use]
    pub fn with_session(mut self, session: SessionScope) -> Self {
        self.session = Some(session);
        self
    }

    /// Fill unset fields from `defaults`
    #[must_use]
    pub fn or(mut self, defaults: &Self) -> Self {
        if self.model.is_none() {
            self.model.clone_from(&defaults.model);
        }
        if self.temperature.is_none() {
            self.temperature = defaults.temperature;
        }
        if self.system.is_none() {
            self.system.clone_from(&defaults.system);
        }
        if self.session.is_none() {
            self.session.clone_from(&defaults.session);
        }
        self
    }
}

/// Grounding information attached to a final response
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Number of grounding sources consulted
    pub sources: usize,
}

/// Terminal result of a generation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalResponse {
    /// Complete generated text
    pub text: String,
    /// Grounding metadata, when the collaborator reports any
    pub provenance: Option<Provenance>,
}

impl FinalResponse {
    /// Plain text response without provenance
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provenance: None,
        }
    }
}

/// Item of a generation stream
#[derive(Clone, Debug, PartialEq)]
pub enum GenerationEvent {
    /// Incremental text fragment
    Delta(String),
    /// Final response marker, always the last item
    Final(FinalResponse),
}

/// Lazy, finite, non-restartable stream of generation events
///
/// Dropping the stream abandons the underlying request.
pub type GenerationStream<'a> =
    Pin<Box<dyn Stream<Item = Result<GenerationEvent, GenerationError>> + Send + 'a>>;

/// Text-generation collaborator, optionally tool-augmented
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a complete response
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] when the collaborator fails.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<FinalResponse, GenerationError>;

    /// Generate a response as a stream of fragments
    ///
    /// The default implementation awaits [`Generator::generate`] and emits its
    /// text as a single fragment.
    fn generate_stream<'a>(
        &'a self,
        prompt: &'a str,
        options: &'a GenerationOptions,
    ) -> GenerationStream<'a> {
        Box::pin(async_stream::stream! {
            match self.generate(prompt, options).await {
                Ok(response) => {
                    if !response.text.is_empty() {
                        yield Ok(GenerationEvent::Delta(response.text.clone()));
                    }
                    yield Ok(GenerationEvent::Final(response));
                }
                Err(e) => yield Err(e),
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use futures::StreamExt;

    struct Fixed(&'static str);

    #[async_trait]
    impl Generator for Fixed {
        async fn generate(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<FinalResponse, GenerationError> {
            Ok(FinalResponse::text(self.0))
        }
    }

    #[test]
    fn test_options_builder() {
        let options = GenerationOptions::default()
            .with_model("claude-sonnet-4-5-20250929")
            .with_temperature(0.0)
            .with_response_format(ResponseFormat::Json)
            .with_system("You are a meticulous fact-checker.");

        assert_eq!(options.model.as_deref(), Some("claude-sonnet-4-5-20250929"));
        assert_eq!(options.temperature, Some(0.0));
        assert_eq!(options.response_format, ResponseFormat::Json);
        assert!(options.session.is_none());
    }

    #[test]
    fn test_options_or_keeps_own_values() {
        let defaults = GenerationOptions::default()
            .with_model("default-model")
            .with_temperature(0.7)
            .with_system("default system");
        let merged = GenerationOptions::default()
            .with_temperature(0.0)
            .or(&defaults);

        assert_eq!(merged.model.as_deref(), Some("default-model"));
        assert_eq!(merged.temperature, Some(0.0));
        assert_eq!(merged.system.as_deref(), Some("default system"));
    }

    #[tokio::test]
    async fn test_default_stream_adapts_generate() {
        let generator = Fixed("hello world");
        let options = GenerationOptions::default();
        let events: Vec<_> = generator
            .generate_stream("prompt", &options)
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                GenerationEvent::Delta("hello world".to_string()),
                GenerationEvent::Final(FinalResponse::text("hello world")),
            ]
        );
    }

    #[tokio::test]
    async fn test_default_stream_skips_empty_delta() {
        let generator = Fixed("");
        let options = GenerationOptions::default();
        let events: Vec<_> = generator
            .generate_stream("prompt", &options)
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(events, vec![GenerationEvent::Final(FinalResponse::text(""))]);
    }
}
