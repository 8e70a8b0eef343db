//! Tool contract
//!
//! A tool is a named callable with a JSON parameter schema. Collaborators
//! invoke tools zero or more times while producing a step's output.

use crate::error::ToolError;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Result of a tool call
///
/// `Ok` may carry an empty value (`[]`, `null`); that is a valid empty result,
/// not a failure.
pub type ToolOutput = Result<serde_json::Value, ToolError>;

/// Async tool executor
pub type ToolExecutorFn = Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, ToolOutput> + Send + Sync>;

/// Tool definition advertised to the collaborator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (used to identify which tool to call)
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON schema for the tool's input parameters
    pub input_schema: serde_json::Value,
}

/// A tool: definition plus executor
#[derive(Clone)]
pub struct Tool {
    definition: ToolDefinition,
    executor: ToolExecutorFn,
}

impl Tool {
    /// Create a tool from a definition and executor
    #[must_use]
    pub fn new(definition: ToolDefinition, executor: ToolExecutorFn) -> Self {
        Self {
            definition,
            executor,
        }
    }

    /// Create a tool from an async function
    #[must_use]
    pub fn from_fn<F, Fut>(definition: ToolDefinition, f: F) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolOutput> + Send + 'static,
    {
        let executor: ToolExecutorFn = Arc::new(move |args| Box::pin(f(args)));
        Self::new(definition, executor)
    }

    /// Tool name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Tool definition
    #[must_use]
    pub const fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Invoke the tool
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when the tool fails; lookup misses are
    /// [`ToolError::NotFound`].
    pub async fn call(&self, args: serde_json::Value) -> ToolOutput {
        (self.executor)(args).await
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

/// Deserialize tool arguments into a typed record
///
/// # Errors
///
/// Returns [`ToolError::InvalidArguments`] if `args` does not fit `T`.
pub fn parse_args<T: DeserializeOwned>(args: serde_json::Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct EchoArgs {
        text: String,
    }

    fn echo_tool() -> Tool {
        Tool::from_fn(
            ToolDefinition {
                name: "echo".to_string(),
                description: "Echo the input".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"text": {"type": "string"}},
                    "required": ["text"]
                }),
            },
            |args| async move {
                let args: EchoArgs = parse_args(args)?;
                Ok(json!(args.text))
            },
        )
    }

    #[tokio::test]
    async fn test_tool_call() {
        let tool = echo_tool();
        assert_eq!(tool.name(), "echo");
        assert_eq!(tool.call(json!({"text": "hi"})).await.unwrap(), json!("hi"));
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let tool = echo_tool();
        let err = tool.call(json!({"wrong": 1})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_debug_omits_executor() {
        let rendered = format!("{:?}", echo_tool());
        assert!(rendered.contains("echo"));
        assert!(rendered.ends_with(".. }"));
    }
}
