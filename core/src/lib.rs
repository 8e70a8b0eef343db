//! # Agentflow Core
//!
//! Core types for multi-step agent orchestration.
//!
//! A [`Pipeline`] is an ordered, validated sequence of [`Step`]s. Each step
//! reads named values out of a per-invocation [`SharedState`], renders its
//! [`PromptTemplate`], hands the prompt to a [`Generator`] and writes the
//! result back under its own output key.
//!
//! ## Core Concepts
//!
//! - **Step**: named unit of work delegating to a generation collaborator
//! - **Shared State**: strongly keyed map of step outputs for one invocation
//! - **Pipeline**: steps in declared order, input reachability checked at build time
//! - **Generator**: the opaque text-generation collaborator (stubbed or network-backed)
//! - **Tool**: a callable the collaborator may invoke while producing a step's output
//!
//! ## Example
//!
//! ```ignore
//! use agentflow_core::{Pipeline, SharedState, Step};
//!
//! let extract = Step::builder("extract", generator.clone())
//!     .instruction("Extract the technical specifications from:\n\n{text_input}")
//!     .output_key("specifications")
//!     .build()?;
//!
//! let pipeline = Pipeline::builder("specs")
//!     .input("text_input")
//!     .step(extract)
//!     .build()?;
//!
//! let state = pipeline
//!     .run(SharedState::new().with("text_input", "16GB of RAM, 1TB SSD"))
//!     .await?;
//! ```

pub mod error;
pub mod generation;
pub mod pipeline;
pub mod session;
pub mod state;
pub mod step;
pub mod template;
pub mod tool;

pub use error::{DefinitionError, DefinitionFault, FlowError, GenerationError, ToolError};
pub use generation::{
    FinalResponse, GenerationEvent, GenerationOptions, GenerationStream, Generator, Provenance,
    ResponseFormat,
};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use session::SessionScope;
pub use state::{SharedState, StateKey, StateValue};
pub use step::{OutputKind, Step, StepBuilder};
pub use template::{PromptTemplate, TemplateError};
pub use tool::{Tool, ToolDefinition, ToolExecutorFn, ToolOutput, parse_args};
