//! Error taxonomy for pipeline definition and execution

use crate::state::StateKey;
use crate::template::TemplateError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by steps, pipelines and runners
///
/// Execution is fail-fast: the caller receives either a complete final state
/// or the first of these errors, carrying the step name and cause.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The step graph is malformed (detected at construction, never retried)
    #[error(transparent)]
    PipelineDefinition(#[from] DefinitionError),

    /// A step's declared input is absent from shared state
    #[error("step `{step}` is missing required input `{key}`")]
    MissingInput {
        /// Step that could not run
        step: String,
        /// Key that was not present
        key: StateKey,
    },

    /// The generation collaborator failed for a step
    #[error("step `{step}` failed: {source}")]
    Generation {
        /// Step whose collaborator failed
        step: String,
        /// Underlying cause
        #[source]
        source: GenerationError,
    },
}

impl FlowError {
    /// Name of the step the error is attributed to, if any
    #[must_use]
    pub fn step(&self) -> Option<&str> {
        match self {
            Self::PipelineDefinition(_) => None,
            Self::MissingInput { step, .. } | Self::Generation { step, .. } => Some(step),
        }
    }

    /// Attribute a collaborator failure to `step`
    #[must_use]
    pub fn generation(step: &str, source: GenerationError) -> Self {
        Self::Generation {
            step: step.to_string(),
            source,
        }
    }
}

/// A pipeline or step definition was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid definition of `{scope}`: {fault}")]
pub struct DefinitionError {
    /// Pipeline or step name the fault was found in
    pub scope: String,
    /// What is wrong with it
    pub fault: DefinitionFault,
}

impl DefinitionError {
    pub(crate) fn new(scope: impl Into<String>, fault: DefinitionFault) -> Self {
        Self {
            scope: scope.into(),
            fault,
        }
    }
}

/// Specific definition faults
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionFault {
    /// Pipeline has no steps
    #[error("pipeline has no steps")]
    Empty,

    /// Step name is empty
    #[error("step name must not be empty")]
    UnnamedStep,

    /// Two steps share a name
    #[error("step `{step}` is declared more than once")]
    DuplicateStep {
        /// Repeated name
        step: String,
    },

    /// Step has no instruction template
    #[error("step has no instruction")]
    MissingInstruction,

    /// Instruction template does not parse
    #[error("invalid instruction template: {0}")]
    Template(#[from] TemplateError),

    /// A declared key is not a valid identifier
    #[error("`{key}` is not a valid state key")]
    InvalidKey {
        /// Rejected key
        key: String,
    },

    /// A step reads its own output key
    #[error("step `{step}` reads its own output `{key}`")]
    SelfReference {
        /// Offending step
        step: String,
        /// Its output key
        key: StateKey,
    },

    /// A key is written twice (by two steps, or by a step and external input)
    #[error("step `{step}` writes `{key}`, which is already provided earlier")]
    DuplicateOutput {
        /// Second writer
        step: String,
        /// Key written twice
        key: StateKey,
    },

    /// A step reads a key only produced by itself or a later step
    #[error("step `{step}` reads `{key}` before step `{producer}` produces it")]
    ForwardReference {
        /// Reading step
        step: String,
        /// Key read too early
        key: StateKey,
        /// Step that produces it later
        producer: String,
    },

    /// A step reads a key nobody provides
    #[error("step `{step}` reads `{key}`, which is neither an external input nor a step output")]
    UnresolvedInput {
        /// Reading step
        step: String,
        /// Unresolved key
        key: StateKey,
    },
}

/// Failures of the generation collaborator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// The collaborator did not answer in time
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    /// Structured output could not be parsed or lacks required fields
    #[error("malformed structured output: {0}")]
    MalformedOutput(String),

    /// Provider or transport failure
    #[error("provider error: {0}")]
    Provider(String),

    /// Provider asked us to slow down
    #[error("rate limited by provider")]
    RateLimited,

    /// Credential rejected
    #[error("credential rejected by provider")]
    Unauthorized,

    /// Stream ended without a final response
    #[error("stream ended before the final response")]
    IncompleteStream,

    /// The tool sub-loop did not converge
    #[error("model kept requesting tools after {0} rounds")]
    ToolRoundsExceeded(usize),
}

impl GenerationError {
    /// Whether retrying the same request may succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Provider(_) | Self::RateLimited)
    }
}

/// Tool invocation failures
///
/// A failure is always distinguishable from a successful but empty result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// Lookup miss
    #[error("{what} `{key}` not found")]
    NotFound {
        /// Kind of thing looked up (e.g. "ticker")
        what: String,
        /// Key that missed
        key: String,
    },

    /// Arguments do not match the tool's schema
    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),

    /// No tool registered under this name
    #[error("unknown tool `{0}`")]
    UnknownTool(String),

    /// Tool ran but failed (transport, upstream status, ...)
    #[error("tool execution failed: {0}")]
    Failed(String),
}

impl ToolError {
    /// Convenience constructor for lookup misses
    #[must_use]
    pub fn not_found(what: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            key: key.into(),
        }
    }
}
