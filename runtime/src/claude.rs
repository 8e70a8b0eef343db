//! Claude-backed generation collaborator
//!
//! [`ClaudeGenerator`] implements [`Generator`] over the Anthropic Messages
//! API, optionally running a tool-use sub-loop against a [`ToolRegistry`].
//!
//! ## Tool loop
//!
//! 1. Send the prompt with the registry's tool definitions
//! 2. If the model stops for `tool_use`, execute every requested tool
//! 3. Send all results back in one user message (`is_error` for failures)
//! 4. Repeat until the model ends its turn, or `max_tool_rounds` is exceeded
//!
//! The same loop runs for streaming; text fragments from every turn are
//! forwarded as they arrive.

use crate::config::{ConfigError, RunnerConfig};
use crate::metrics::ToolMetrics;
use crate::retry::{retry_with_predicate, RetryPolicy};
use agentflow_anthropic::{
    text_of, AnthropicClient, ClaudeError, ContentBlock, ContentDelta, EventStream, Message,
    MessagesRequest, MessagesResponse, StopReason, StreamEvent, ToolResultBlock,
};
use agentflow_core::{
    FinalResponse, GenerationError, GenerationEvent, GenerationOptions, GenerationStream,
    Generator, Provenance, ResponseFormat,
};
use agentflow_tools::{ToolDefinition, ToolError, ToolRegistry};
use async_stream::stream;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

const JSON_HINT: &str =
    "Respond with a single JSON object only. Do not wrap it in prose or Markdown.";

/// Generator backed by Claude
#[derive(Clone, Debug)]
pub struct ClaudeGenerator {
    client: AnthropicClient,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_tool_rounds: usize,
    timeout: Duration,
    retry: RetryPolicy,
    tools: Option<ToolRegistry>,
}

impl ClaudeGenerator {
    /// Build a generator from runner configuration
    ///
    /// # Errors
    ///
    /// Returns the configuration's validation error, or
    /// [`ConfigError::Invalid`] if the HTTP client cannot be set up.
    pub fn from_config(config: &RunnerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = AnthropicClient::builder(config.credential.expose())
            .base_url(&config.api_url)
            .timeout(config.timeout)
            .build()
            .map_err(|e| match e {
                ClaudeError::MissingApiKey => ConfigError::MissingCredential,
                other => ConfigError::Invalid {
                    field: "api_url",
                    reason: other.to_string(),
                },
            })?;

        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_tool_rounds: config.max_tool_rounds,
            timeout: config.timeout,
            retry: RetryPolicy::builder().max_retries(config.max_retries).build(),
            tools: None,
        })
    }

    /// Let the model call tools from `registry`
    #[must_use]
    pub fn with_tools(mut self, registry: ToolRegistry) -> Self {
        self.tools = Some(registry);
        self
    }

    /// Replace the retry policy for transient failures
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    fn request(&self, messages: Vec<Message>, options: &GenerationOptions) -> MessagesRequest {
        let mut request = MessagesRequest::new(messages)
            .with_model(options.model.clone().unwrap_or_else(|| self.model.clone()))
            .with_max_tokens(self.max_tokens)
            .with_temperature(options.temperature.unwrap_or(self.temperature));

        let system = match (options.system.as_deref(), options.response_format) {
            (Some(system), ResponseFormat::Json) => Some(format!("{system}\n\n{JSON_HINT}")),
            (Some(system), ResponseFormat::Text) => Some(system.to_string()),
            (None, ResponseFormat::Json) => Some(JSON_HINT.to_string()),
            (None, ResponseFormat::Text) => None,
        };
        if let Some(system) = system {
            request = request.with_system(system);
        }
        if let Some(session) = &options.session {
            request = request.with_user_id(session.user_id.clone());
        }
        if let Some(tools) = &self.tools {
            request = request.with_tools(tools.definitions().into_iter().map(to_api_tool).collect());
        }
        request
    }

    async fn send(&self, request: MessagesRequest) -> Result<MessagesResponse, GenerationError> {
        retry_with_predicate(
            &self.retry,
            || self.client.messages(request.clone()),
            ClaudeError::is_transient,
        )
        .await
        .map_err(|e| self.map_error(e))
    }

    async fn open(&self, request: MessagesRequest) -> Result<EventStream, GenerationError> {
        retry_with_predicate(
            &self.retry,
            || self.client.messages_stream(request.clone()),
            ClaudeError::is_transient,
        )
        .await
        .map_err(|e| self.map_error(e))
    }

    fn map_error(&self, error: ClaudeError) -> GenerationError {
        match error {
            ClaudeError::Timeout => GenerationError::Timeout(self.timeout),
            ClaudeError::RateLimited => GenerationError::RateLimited,
            ClaudeError::Unauthorized | ClaudeError::MissingApiKey => GenerationError::Unauthorized,
            ClaudeError::ApiError { status, message } => {
                GenerationError::Provider(format!("status {status}: {message}"))
            }
            other => GenerationError::Provider(other.to_string()),
        }
    }

    /// Run every tool requested in `content`, in order
    ///
    /// Returns the result blocks and the number of successful calls.
    async fn run_tools(&self, content: &[ContentBlock]) -> (Vec<ToolResultBlock>, usize) {
        let mut results = Vec::new();
        let mut succeeded = 0;

        for block in content {
            let ContentBlock::ToolUse { id, name, input } = block else {
                continue;
            };
            let outcome = match &self.tools {
                Some(registry) => registry.execute(name, input.clone()).await,
                None => Err(ToolError::UnknownTool(name.clone())),
            };
            ToolMetrics::record_call(name, outcome.is_ok());

            let (content, is_error) = match outcome {
                Ok(serde_json::Value::String(text)) => (text, false),
                Ok(value) => (value.to_string(), false),
                Err(e) => (e.to_string(), true),
            };
            tracing::info!(tool = %name, is_error, "Tool call finished");
            if !is_error {
                succeeded += 1;
            }
            results.push(ToolResultBlock {
                tool_use_id: id.clone(),
                content,
                is_error,
            });
        }
        (results, succeeded)
    }

    fn provenance(&self, sources: usize) -> Option<Provenance> {
        self.tools.as_ref().map(|_| Provenance { sources })
    }
}

fn to_api_tool(definition: ToolDefinition) -> agentflow_anthropic::Tool {
    agentflow_anthropic::Tool {
        name: definition.name,
        description: definition.description,
        input_schema: definition.input_schema,
    }
}

fn requests_tools(stop_reason: Option<&StopReason>, content: &[ContentBlock]) -> bool {
    stop_reason == Some(&StopReason::ToolUse)
        && content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
}

#[async_trait]
impl Generator for ClaudeGenerator {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<FinalResponse, GenerationError> {
        let mut messages = vec![Message::user(prompt)];
        let mut text = String::new();
        let mut sources = 0;
        let mut rounds = 0;

        loop {
            let request = self.request(messages.clone(), options);
            tracing::debug!(model = %request.model, round = rounds, "Sending Claude request");
            let response = self.send(request).await?;
            // Text from every turn, matching what the streaming path delivers
            text.push_str(&text_of(&response.content));

            if !requests_tools(response.stop_reason.as_ref(), &response.content) {
                return Ok(FinalResponse {
                    text,
                    provenance: self.provenance(sources),
                });
            }
            if rounds == self.max_tool_rounds {
                return Err(GenerationError::ToolRoundsExceeded(self.max_tool_rounds));
            }
            rounds += 1;

            let (results, succeeded) = self.run_tools(&response.content).await;
            sources += succeeded;
            messages.push(Message::assistant_blocks(response.content));
            messages.push(Message::tool_results(results));
        }
    }

    fn generate_stream<'a>(
        &'a self,
        prompt: &'a str,
        options: &'a GenerationOptions,
    ) -> GenerationStream<'a> {
        Box::pin(stream! {
            let mut messages = vec![Message::user(prompt)];
            let mut text = String::new();
            let mut sources = 0;
            let mut rounds = 0;

            loop {
                let request = self.request(messages.clone(), options);
                tracing::debug!(model = %request.model, round = rounds, "Opening Claude stream");
                let events = match self.open(request).await {
                    Ok(events) => events,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };

                let mut turn = Turn::default();
                for await event in events {
                    match event {
                        Ok(event) => {
                            if let Some(fragment) = turn.apply(event) {
                                text.push_str(&fragment);
                                yield Ok(GenerationEvent::Delta(fragment));
                            }
                        }
                        Err(e) => {
                            yield Err(self.map_error(e));
                            return;
                        }
                    }
                }

                if !turn.finished {
                    yield Err(GenerationError::IncompleteStream);
                    return;
                }
                let stop_reason = turn.stop_reason.clone();
                let content = match turn.into_content() {
                    Ok(content) => content,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };

                if !requests_tools(stop_reason.as_ref(), &content) {
                    yield Ok(GenerationEvent::Final(FinalResponse {
                        text,
                        provenance: self.provenance(sources),
                    }));
                    return;
                }
                if rounds == self.max_tool_rounds {
                    yield Err(GenerationError::ToolRoundsExceeded(self.max_tool_rounds));
                    return;
                }
                rounds += 1;

                let (results, succeeded) = self.run_tools(&content).await;
                sources += succeeded;
                messages.push(Message::assistant_blocks(content));
                messages.push(Message::tool_results(results));
            }
        })
    }
}

/// Content block under construction from stream events
#[derive(Debug)]
enum PartialBlock {
    Text(String),
    ToolUse {
        id: String,
        name: String,
        input_json: String,
    },
}

/// One assistant turn reassembled from SSE events
#[derive(Debug, Default)]
struct Turn {
    blocks: BTreeMap<usize, PartialBlock>,
    stop_reason: Option<StopReason>,
    finished: bool,
}

impl Turn {
    /// Fold an event into the turn, returning any text fragment it carries
    fn apply(&mut self, event: StreamEvent) -> Option<String> {
        match event {
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => {
                let (block, initial) = match content_block {
                    ContentBlock::Text { text } => {
                        let initial = (!text.is_empty()).then(|| text.clone());
                        (PartialBlock::Text(text), initial)
                    }
                    ContentBlock::ToolUse { id, name, .. } => (
                        PartialBlock::ToolUse {
                            id,
                            name,
                            input_json: String::new(),
                        },
                        None,
                    ),
                    ContentBlock::ToolResult { .. } => return None,
                };
                self.blocks.insert(index, block);
                initial
            }
            StreamEvent::ContentBlockDelta { index, delta } => match delta {
                ContentDelta::TextDelta { text } => {
                    if let PartialBlock::Text(buffer) = self
                        .blocks
                        .entry(index)
                        .or_insert_with(|| PartialBlock::Text(String::new()))
                    {
                        buffer.push_str(&text);
                    }
                    (!text.is_empty()).then_some(text)
                }
                ContentDelta::InputJsonDelta { partial_json } => {
                    if let Some(PartialBlock::ToolUse { input_json, .. }) = self.blocks.get_mut(&index) {
                        input_json.push_str(&partial_json);
                    }
                    None
                }
            },
            StreamEvent::MessageDelta { delta, .. } => {
                if delta.stop_reason.is_some() {
                    self.stop_reason = delta.stop_reason;
                }
                None
            }
            StreamEvent::MessageStop => {
                self.finished = true;
                None
            }
            StreamEvent::MessageStart { .. }
            | StreamEvent::ContentBlockStop { .. }
            | StreamEvent::Ping
            | StreamEvent::Error { .. } => None,
        }
    }

    /// Finished content blocks, in index order
    fn into_content(self) -> Result<Vec<ContentBlock>, GenerationError> {
        self.blocks
            .into_values()
            .map(|block| match block {
                PartialBlock::Text(text) => Ok(ContentBlock::Text { text }),
                PartialBlock::ToolUse {
                    id,
                    name,
                    input_json,
                } => {
                    let input = if input_json.trim().is_empty() {
                        serde_json::json!({})
                    } else {
                        serde_json::from_str(&input_json).map_err(|e| {
                            GenerationError::Provider(format!("unreadable input for tool `{name}`: {e}"))
                        })?
                    };
                    Ok(ContentBlock::ToolUse { id, name, input })
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use agentflow_anthropic::MessageDelta;
    use agentflow_core::SessionScope;
    use agentflow_tools::stock_price_tool;

    fn generator() -> ClaudeGenerator {
        ClaudeGenerator::from_config(&RunnerConfig::new("sk-test")).unwrap()
    }

    #[test]
    fn test_request_applies_options_over_defaults() {
        let options = GenerationOptions::default()
            .with_model("claude-haiku-4-5")
            .with_temperature(0.3)
            .with_system("You are a fact checker.")
            .with_response_format(ResponseFormat::Json)
            .with_session(SessionScope::new("app", "user_42", "s1"));

        let request = generator().request(vec![Message::user("hi")], &options);

        assert_eq!(request.model, "claude-haiku-4-5");
        assert_eq!(request.temperature, Some(0.3));
        let system = request.system.unwrap();
        assert!(system.starts_with("You are a fact checker."));
        assert!(system.ends_with(JSON_HINT));
        assert_eq!(request.metadata.unwrap().user_id, "user_42");
        assert_eq!(request.tools, None);
    }

    #[test]
    fn test_request_uses_config_defaults() {
        let request = generator().request(vec![Message::user("hi")], &GenerationOptions::default());

        assert_eq!(request.model, agentflow_anthropic::DEFAULT_MODEL);
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.system, None);
        assert_eq!(request.metadata, None);
    }

    #[test]
    fn test_request_advertises_registered_tools() {
        let generator = generator().with_tools(ToolRegistry::with_tools([stock_price_tool()]));
        let request = generator.request(vec![Message::user("hi")], &GenerationOptions::default());

        let tools = request.tools.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "get_stock_price");
    }

    #[test]
    fn test_error_mapping() {
        let generator = generator();
        assert_eq!(
            generator.map_error(ClaudeError::Timeout),
            GenerationError::Timeout(Duration::from_secs(60))
        );
        assert_eq!(
            generator.map_error(ClaudeError::RateLimited),
            GenerationError::RateLimited
        );
        assert_eq!(
            generator.map_error(ClaudeError::Unauthorized),
            GenerationError::Unauthorized
        );
        assert!(matches!(
            generator.map_error(ClaudeError::ApiError {
                status: 500,
                message: "boom".to_string()
            }),
            GenerationError::Provider(ref m) if m.contains("500")
        ));
    }

    #[tokio::test]
    async fn test_tool_failures_are_reported_not_hidden() {
        let generator = generator().with_tools(ToolRegistry::with_tools([stock_price_tool()]));
        let content = vec![
            ContentBlock::ToolUse {
                id: "toolu_1".to_string(),
                name: "get_stock_price".to_string(),
                input: serde_json::json!({"ticker": "AAPL"}),
            },
            ContentBlock::ToolUse {
                id: "toolu_2".to_string(),
                name: "get_stock_price".to_string(),
                input: serde_json::json!({"ticker": "ZZZZ"}),
            },
            ContentBlock::ToolUse {
                id: "toolu_3".to_string(),
                name: "launch_rocket".to_string(),
                input: serde_json::json!({}),
            },
        ];

        let (results, succeeded) = generator.run_tools(&content).await;

        assert_eq!(succeeded, 1);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].content, "178.15");
        assert!(!results[0].is_error);
        assert!(results[1].is_error);
        assert!(results[1].content.contains("ZZZZ"));
        assert!(results[2].is_error);
        assert!(results[2].content.contains("launch_rocket"));
    }

    #[test]
    fn test_turn_reassembles_tool_input() {
        let mut turn = Turn::default();
        let events = vec![
            StreamEvent::ContentBlockStart {
                index: 0,
                content_block: ContentBlock::Text {
                    text: String::new(),
                },
            },
            StreamEvent::ContentBlockDelta {
                index: 0,
                delta: ContentDelta::TextDelta {
                    text: "Checking".to_string(),
                },
            },
            StreamEvent::ContentBlockStart {
                index: 1,
                content_block: ContentBlock::ToolUse {
                    id: "toolu_1".to_string(),
                    name: "get_stock_price".to_string(),
                    input: serde_json::json!({}),
                },
            },
            StreamEvent::ContentBlockDelta {
                index: 1,
                delta: ContentDelta::InputJsonDelta {
                    partial_json: "{\"ticker\":".to_string(),
                },
            },
            StreamEvent::ContentBlockDelta {
                index: 1,
                delta: ContentDelta::InputJsonDelta {
                    partial_json: "\"AAPL\"}".to_string(),
                },
            },
            StreamEvent::Ping,
            StreamEvent::MessageDelta {
                delta: MessageDelta {
                    stop_reason: Some(StopReason::ToolUse),
                    stop_sequence: None,
                },
                usage: None,
            },
            StreamEvent::MessageStop,
        ];

        let fragments: Vec<String> = events.into_iter().filter_map(|e| turn.apply(e)).collect();
        assert_eq!(fragments, vec!["Checking".to_string()]);
        assert!(turn.finished);
        assert_eq!(turn.stop_reason, Some(StopReason::ToolUse));

        let content = turn.into_content().unwrap();
        assert_eq!(
            content[1],
            ContentBlock::ToolUse {
                id: "toolu_1".to_string(),
                name: "get_stock_price".to_string(),
                input: serde_json::json!({"ticker": "AAPL"}),
            }
        );
    }

    #[test]
    fn test_turn_forwards_text_carried_by_block_start() {
        let mut turn = Turn::default();
        let first = turn.apply(StreamEvent::ContentBlockStart {
            index: 0,
            content_block: ContentBlock::Text {
                text: "Let me ".to_string(),
            },
        });
        let second = turn.apply(StreamEvent::ContentBlockDelta {
            index: 0,
            delta: ContentDelta::TextDelta {
                text: "check.".to_string(),
            },
        });

        assert_eq!(first.as_deref(), Some("Let me "));
        assert_eq!(second.as_deref(), Some("check."));
        assert_eq!(
            turn.into_content().unwrap(),
            vec![ContentBlock::Text {
                text: "Let me check.".to_string()
            }]
        );
    }

    #[test]
    fn test_turn_rejects_truncated_tool_input() {
        let mut turn = Turn::default();
        turn.apply(StreamEvent::ContentBlockStart {
            index: 0,
            content_block: ContentBlock::ToolUse {
                id: "toolu_1".to_string(),
                name: "get_stock_price".to_string(),
                input: serde_json::json!({}),
            },
        });
        turn.apply(StreamEvent::ContentBlockDelta {
            index: 0,
            delta: ContentDelta::InputJsonDelta {
                partial_json: "{\"tick".to_string(),
            },
        });

        assert!(matches!(turn.into_content(), Err(GenerationError::Provider(_))));
    }
}
