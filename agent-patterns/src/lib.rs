//! Agent Patterns
//!
//! Ready-made pipelines for common agent designs. Every pattern is a plain
//! [`Pipeline`](agentflow_core::Pipeline) built over any
//! [`Generator`](agentflow_core::Generator), so the same definition runs
//! against Claude in production and a scripted collaborator in tests.
//!
//! ## Four Patterns
//!
//! 1. **Prompt Chaining**: each step consumes the previous step's output
//! 2. **Reflection**: a writer drafts, a fact-checker returns a structured critique
//! 3. **Tool Use**: a persona answers with help from registered tools
//! 4. **Planning**: plan first, then write from the plan
//!
//! ## Example
//!
//! ```ignore
//! use agentflow_patterns::prompt_chain::{spec_extraction_chain, HardwareSpec, TEXT_INPUT};
//!
//! let pipeline = spec_extraction_chain(generator)?;
//! let output = runner
//!     .invoke_output(&pipeline, SharedState::new().with(TEXT_INPUT, laptop_blurb))
//!     .await?;
//! let spec = HardwareSpec::from_output(&output)?;
//! assert_eq!(spec.memory, "16GB");
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod persona;
pub mod planning;
pub mod prompt_chain;
pub mod reflection;
pub mod tool_use;

// Re-export commonly used types
pub use error::PatternError;
pub use persona::Persona;
pub use planning::{PlannedReport, plan_and_write};
pub use prompt_chain::{HardwareSpec, PromptChain, spec_extraction_chain};
pub use reflection::{Critique, Verdict, write_and_review};
pub use tool_use::{financial_analyst, financial_tools, search_assistant, search_tools};
