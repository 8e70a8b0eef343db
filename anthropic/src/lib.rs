//! # Anthropic Claude API Client
//!
//! Client for the Anthropic Messages API with support for tool use and
//! streaming responses. Used by the Claude-backed generator in
//! `agentflow-runtime`.
//!
//! ## Example
//!
//! ```no_run
//! use agentflow_anthropic::{AnthropicClient, MessagesRequest};
//! use agentflow_anthropic::types::Message;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create client from ANTHROPIC_API_KEY environment variable
//!     let client = AnthropicClient::from_env()?;
//!
//!     let request = MessagesRequest::new(vec![Message::user("Hello, Claude!")])
//!         .with_temperature(0.0);
//!
//!     let response = client.messages(request).await?;
//!
//!     println!("Response: {:?}", response);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - Non-streaming messages API with per-request timeout
//! - Streaming responses with Server-Sent Events (SSE), including `ping` and
//!   in-stream `error` events
//! - Tool use support
//! - Configurable base URL for proxies and test servers

pub mod client;
pub mod error;
pub mod messages;
pub mod types;

// Re-export main types for convenience
pub use client::{AnthropicClient, AnthropicClientBuilder, EventStream, DEFAULT_API_URL};
pub use error::ClaudeError;
pub use messages::{
    ContentDelta, MessageDelta, MessageStart, MessagesRequest, MessagesResponse, StreamError,
    StreamEvent, DEFAULT_MODEL,
};
pub use types::{
    text_of, ContentBlock, Message, Metadata, Role, StopReason, Tool, ToolResultBlock, Usage,
};
