//! Built-in tools for Agentflow pipelines
//!
//! Tools return plain JSON values and never format data for a particular
//! model API; the Claude adapter in `agentflow-runtime` handles that.
//!
//! A lookup that finds nothing is an error ([`ToolError::NotFound`]), while
//! a search that legitimately matches nothing returns an empty array. No tool
//! substitutes placeholder text for a missing answer.
//!
//! ## Modules
//!
//! - `registry`: Tool registry for dynamic tool management
//! - `finance`: Simulated stock prices (`get_stock_price`)
//! - `search`: Canned facts (`search_information`) and live web search (`web_search`)

pub mod finance;
pub mod registry;
pub mod search;

pub use agentflow_core::{Tool, ToolDefinition, ToolError, ToolExecutorFn, ToolOutput};

// Re-export commonly used types
pub use finance::{lookup_price, stock_price_tool};
pub use registry::ToolRegistry;
pub use search::{
    lookup_answer, search_information_tool, web_search, web_search_tool, SearchHit,
    WebSearchConfig,
};
