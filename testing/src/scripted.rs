//! Deterministic generation collaborator for tests

#![allow(clippy::module_name_repetitions)] // ScriptedGenerator is the natural name

use crate::tracker::ConnectionTracker;
use agentflow_core::{
    FinalResponse, GenerationError, GenerationEvent, GenerationOptions, GenerationStream,
    Generator, Provenance,
};
use async_stream::stream;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Clone, Debug)]
enum Reply {
    Text(String),
    Fail(GenerationError),
    Hang,
}

/// A prompt the generator received, with the options it came with
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    /// Rendered prompt
    pub prompt: String,
    /// Options passed by the step
    pub options: GenerationOptions,
}

/// Generator that answers from a script
///
/// Replies are chosen by the first rule whose needle occurs in the prompt,
/// then the fallback. Every call is recorded in order. Streaming splits the
/// reply into word fragments.
///
/// # Example
///
/// ```ignore
/// let generator = Arc::new(
///     ScriptedGenerator::new()
///         .respond_when("Extract the technical specifications", "CPU: 3.5 GHz octa-core")
///         .respond_when("Transform", r#"{"cpu": "3.5 GHz", "memory": "16GB", "storage": "1TB"}"#),
/// );
/// ```
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    rules: Vec<(String, Reply)>,
    fallback: Option<Reply>,
    provenance: Option<Provenance>,
    fragment_delay: Option<Duration>,
    tracker: Option<ConnectionTracker>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    /// Empty script; every prompt fails until rules are added
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Always reply with `text`
    #[must_use]
    pub fn always(text: impl Into<String>) -> Self {
        Self::new().fallback(text)
    }

    /// Reply with `text` to prompts containing `needle`
    #[must_use]
    pub fn respond_when(mut self, needle: impl Into<String>, text: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Reply::Text(text.into())));
        self
    }

    /// Fail prompts containing `needle` with `error`
    #[must_use]
    pub fn fail_when(mut self, needle: impl Into<String>, error: GenerationError) -> Self {
        self.rules.push((needle.into(), Reply::Fail(error)));
        self
    }

    /// Never answer prompts containing `needle`
    #[must_use]
    pub fn hang_when(mut self, needle: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Reply::Hang));
        self
    }

    /// Reply for prompts no rule matches
    #[must_use]
    pub fn fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(Reply::Text(text.into()));
        self
    }

    /// Attach provenance to every final response
    #[must_use]
    pub const fn with_provenance(mut self, sources: usize) -> Self {
        self.provenance = Some(Provenance { sources });
        self
    }

    /// Pause before each streamed fragment
    #[must_use]
    pub const fn with_fragment_delay(mut self, delay: Duration) -> Self {
        self.fragment_delay = Some(delay);
        self
    }

    /// Count open streams on `tracker`
    #[must_use]
    pub fn with_tracker(mut self, tracker: ConnectionTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Prompts received so far, in call order
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.recorded().into_iter().map(|call| call.prompt).collect()
    }

    /// Calls received so far, in call order
    #[must_use]
    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of calls received
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn record(&self, prompt: &str, options: &GenerationOptions) -> Option<Reply> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                prompt: prompt.to_string(),
                options: options.clone(),
            });
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .or_else(|| self.fallback.clone())
    }

    fn respond(&self, text: String) -> FinalResponse {
        FinalResponse {
            text,
            provenance: self.provenance,
        }
    }
}

fn unscripted(prompt: &str) -> GenerationError {
    let head: String = prompt.chars().take(60).collect();
    GenerationError::Provider(format!("no scripted reply for prompt starting `{head}`"))
}

/// Split `text` into word fragments that concatenate back to `text`
#[must_use]
pub fn word_fragments(text: &str) -> Vec<String> {
    text.split_inclusive(' ').map(str::to_string).collect()
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<FinalResponse, GenerationError> {
        match self.record(prompt, options) {
            Some(Reply::Text(text)) => Ok(self.respond(text)),
            Some(Reply::Fail(error)) => Err(error),
            Some(Reply::Hang) => futures::future::pending().await,
            None => Err(unscripted(prompt)),
        }
    }

    fn generate_stream<'a>(
        &'a self,
        prompt: &'a str,
        options: &'a GenerationOptions,
    ) -> GenerationStream<'a> {
        Box::pin(stream! {
            let _guard = self.tracker.as_ref().map(ConnectionTracker::open);
            let text = match self.record(prompt, options) {
                Some(Reply::Text(text)) => text,
                Some(Reply::Fail(error)) => {
                    yield Err(error);
                    return;
                }
                Some(Reply::Hang) => {
                    futures::future::pending::<()>().await;
                    return;
                }
                None => {
                    yield Err(unscripted(prompt));
                    return;
                }
            };

            for fragment in word_fragments(&text) {
                if let Some(delay) = self.fragment_delay {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(GenerationEvent::Delta(fragment));
            }
            yield Ok(GenerationEvent::Final(self.respond(text)));
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        let generator = ScriptedGenerator::new()
            .respond_when("draft", "first")
            .respond_when("draft about", "second")
            .fallback("fallback");

        let options = GenerationOptions::default();
        assert_eq!(generator.generate("a draft about tides", &options).await.unwrap().text, "first");
        assert_eq!(generator.generate("anything", &options).await.unwrap().text, "fallback");
        assert_eq!(generator.prompts(), vec!["a draft about tides", "anything"]);
    }

    #[tokio::test]
    async fn test_unscripted_prompt_fails() {
        let generator = ScriptedGenerator::new();
        let err = generator
            .generate("hello", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Provider(_)));
    }

    #[tokio::test]
    async fn test_stream_fragments_then_final() {
        let generator = ScriptedGenerator::always("Paris is the capital").with_provenance(1);
        let options = GenerationOptions::default();

        let events: Vec<GenerationEvent> = generator
            .generate_stream("q", &options)
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(events.len(), 5);
        assert_eq!(events[0], GenerationEvent::Delta("Paris ".to_string()));
        assert_eq!(
            events[4],
            GenerationEvent::Final(FinalResponse {
                text: "Paris is the capital".to_string(),
                provenance: Some(Provenance { sources: 1 }),
            })
        );
    }

    #[test]
    fn test_word_fragments_concatenate_back() {
        let text = "16GB of RAM,  1TB SSD ";
        assert_eq!(word_fragments(text).concat(), text);
        assert!(word_fragments("").is_empty());
    }
}
