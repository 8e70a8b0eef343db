//! Tool registry for dynamic tool management
//!
//! The registry provides:
//! - Dynamic tool registration
//! - Thread-safe tool storage
//! - Tool execution by name
//! - Tool listing and introspection

use agentflow_core::{Tool, ToolDefinition, ToolError, ToolOutput};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe tool registry
///
/// Cloning is cheap; clones share the same tool table. Lookups take a read
/// lock only long enough to clone the tool out, so tool calls never hold it.
///
/// ## Example
///
/// ```ignore
/// use agentflow_tools::{stock_price_tool, ToolRegistry};
///
/// let registry = ToolRegistry::new();
/// registry.register(stock_price_tool());
///
/// let price = registry.execute("get_stock_price", json!({"ticker": "AAPL"})).await?;
/// ```
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, Tool>>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding `tools`
    #[must_use]
    pub fn with_tools(tools: impl IntoIterator<Item = Tool>) -> Self {
        let registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    // A panic while holding the lock cannot leave the map half-updated, so
    // a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Tool>> {
        self.tools.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Tool>> {
        self.tools.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a tool
    ///
    /// If a tool with the same name already exists, it is replaced and this
    /// method returns `true`. Otherwise, returns `false`.
    pub fn register(&self, tool: Tool) -> bool {
        self.write().insert(tool.name().to_string(), tool).is_some()
    }

    /// Execute a tool by name
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] if no tool is registered under
    /// `name`, otherwise whatever the tool itself returns.
    pub async fn execute(&self, name: &str, args: serde_json::Value) -> ToolOutput {
        // Release the lock before awaiting
        let tool = self.get(name);
        let Some(tool) = tool else {
            tracing::warn!(tool = name, "Unknown tool requested");
            return Err(ToolError::UnknownTool(name.to_string()));
        };

        let result = tool.call(args).await;
        match &result {
            Ok(_) => tracing::debug!(tool = name, "Tool call succeeded"),
            Err(e) => tracing::info!(tool = name, error = %e, "Tool call failed"),
        }
        result
    }

    /// Registered tool names, sorted alphabetically
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// All tool definitions sorted by name (for passing to the model API)
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .read()
            .values()
            .map(|tool| tool.definition().clone())
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Get a specific tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Tool> {
        self.read().get(name).cloned()
    }

    /// Remove a tool from the registry
    ///
    /// Returns `true` if the tool was removed, `false` if it didn't exist.
    pub fn unregister(&self, name: &str) -> bool {
        self.write().remove(name).is_some()
    }

    /// Number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no tools are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
