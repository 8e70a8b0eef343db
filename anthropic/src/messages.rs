//! Messages API request and response types

use crate::types::{ContentBlock, Message, Metadata, Role, StopReason, Tool, Usage};
use serde::{Deserialize, Serialize};

/// Default model for new requests
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Request to create a message
#[derive(Clone, Debug, Serialize)]
pub struct MessagesRequest {
    /// Model to use (e.g., "claude-sonnet-4-5-20250929")
    pub model: String,
    /// Conversation history
    pub messages: Vec<Message>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Sampling temperature (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Available tools (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// End-user metadata (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Whether to stream the response
    #[serde(default)]
    pub stream: bool,
}

impl MessagesRequest {
    /// Create a basic request with sensible defaults
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            messages,
            max_tokens: 4096,
            system: None,
            temperature: None,
            tools: None,
            metadata: None,
            stream: false,
        }
    }

    /// Builder: Set model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builder: Set max tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Builder: Set system prompt
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Builder: Set sampling temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Builder: Set tools (an empty list is omitted)
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = (!tools.is_empty()).then_some(tools);
        self
    }

    /// Builder: Attach an end-user identifier
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.metadata = Some(Metadata {
            user_id: user_id.into(),
        });
        self
    }

    /// Builder: Enable streaming
    #[must_use]
    pub const fn with_streaming(mut self) -> Self {
        self.stream = true;
        self
    }
}

/// Response from creating a message
#[derive(Clone, Debug, Deserialize)]
pub struct MessagesResponse {
    /// Unique identifier for this message
    pub id: String,
    /// Model that generated the response
    pub model: String,
    /// Role (always "assistant" for responses)
    pub role: Role,
    /// Content blocks in the response
    pub content: Vec<ContentBlock>,
    /// Why the model stopped generating
    pub stop_reason: Option<StopReason>,
    /// Token usage statistics
    #[serde(default)]
    pub usage: Usage,
}

impl MessagesResponse {
    /// Tool-use blocks requested in this response
    pub fn tool_uses(&self) -> impl Iterator<Item = &ContentBlock> {
        self.content
            .iter()
            .filter(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }
}

/// Streaming event types from the Messages API
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Message started
    MessageStart {
        /// Message metadata
        message: MessageStart,
    },
    /// Content block started
    ContentBlockStart {
        /// Index of this content block
        index: usize,
        /// The content block
        content_block: ContentBlock,
    },
    /// Content block delta (incremental update)
    ContentBlockDelta {
        /// Index of the content block
        index: usize,
        /// The delta
        delta: ContentDelta,
    },
    /// Content block stopped
    ContentBlockStop {
        /// Index of the content block
        index: usize,
    },
    /// Message delta (metadata update)
    MessageDelta {
        /// The delta
        delta: MessageDelta,
        /// Cumulative usage, when reported
        #[serde(default)]
        usage: Option<Usage>,
    },
    /// Message stopped
    MessageStop,
    /// Keep-alive
    Ping,
    /// Error reported inside an open stream
    Error {
        /// Error details
        error: StreamError,
    },
}

/// Message start metadata
#[derive(Clone, Debug, Deserialize)]
pub struct MessageStart {
    /// Message ID
    pub id: String,
    /// Model used
    pub model: String,
    /// Role (always "assistant")
    pub role: Role,
}

/// Content delta types
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    /// Text delta
    TextDelta {
        /// Incremental text
        text: String,
    },
    /// Input JSON delta (for tool use)
    InputJsonDelta {
        /// Partial JSON string
        partial_json: String,
    },
}

/// Message delta (stop reason update)
#[derive(Clone, Debug, Deserialize)]
pub struct MessageDelta {
    /// Stop reason (when complete)
    pub stop_reason: Option<StopReason>,
    /// Stop sequence that triggered stop (if applicable)
    #[serde(default)]
    pub stop_sequence: Option<String>,
}

/// Error payload of an in-stream `error` event
#[derive(Clone, Debug, Deserialize)]
pub struct StreamError {
    /// Error type, e.g. `overloaded_error`
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable message
    pub message: String,
}
