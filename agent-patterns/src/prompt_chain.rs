//! Prompt Chaining Pattern
//!
//! Sequential execution where each step uses the previous step's result.
//! Useful for multi-stage workflows like: extract → transform → summarize.
//!
//! ## Pattern
//!
//! 1. Execute link 1 with the chain's input
//! 2. Feed link 1's output to link 2
//! 3. Continue until all links complete
//! 4. The last link's output is the chain's output
//!
//! ## Example
//!
//! ```ignore
//! let pipeline = PromptChain::new("research", generator, "topic")
//!     .then("research", "Research the topic: {topic}", "notes")
//!     .then("analyze", "Analyze this research: {notes}", "analysis")
//!     .build()?;
//! ```

use crate::error::{PatternError, decode};
use agentflow_core::{
    DefinitionError, Generator, Pipeline, PromptTemplate, SharedState, StateKey, StateValue, Step,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Key holding the free-text product description
pub const TEXT_INPUT: &str = "text_input";
/// Key holding the extracted specifications
pub const SPECIFICATIONS: &str = "specifications";
/// Key holding the structured specification
pub const SPEC_JSON: &str = "spec_json";

/// A link in the chain
#[derive(Clone, Debug)]
struct Link {
    name: String,
    instruction: String,
    output: StateKey,
    required: Option<Vec<String>>,
}

/// Builder for linear chains
///
/// Every link reads the previous link's output (the first link reads the
/// chain input). If a link's instruction does not mention the previous key,
/// the value is appended to the prompt.
pub struct PromptChain {
    name: String,
    generator: Arc<dyn Generator>,
    input: StateKey,
    links: Vec<Link>,
    temperature: Option<f32>,
}

impl PromptChain {
    /// Start a chain reading `input`
    #[must_use]
    pub fn new(name: impl Into<String>, generator: Arc<dyn Generator>, input: impl Into<StateKey>) -> Self {
        Self {
            name: name.into(),
            generator,
            input: input.into(),
            links: Vec::new(),
            temperature: None,
        }
    }

    /// Append a free-text link
    #[must_use]
    pub fn then(
        mut self,
        name: impl Into<String>,
        instruction: impl Into<String>,
        output: impl Into<StateKey>,
    ) -> Self {
        self.links.push(Link {
            name: name.into(),
            instruction: instruction.into(),
            output: output.into(),
            required: None,
        });
        self
    }

    /// Append a link that must produce a JSON object with `required` fields
    #[must_use]
    pub fn then_structured<I, S>(
        mut self,
        name: impl Into<String>,
        instruction: impl Into<String>,
        output: impl Into<StateKey>,
        required: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links.push(Link {
            name: name.into(),
            instruction: instruction.into(),
            output: output.into(),
            required: Some(required.into_iter().map(Into::into).collect()),
        });
        self
    }

    /// Sampling temperature for every link
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Build the chain as a pipeline
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError`] for an empty chain or any invalid link.
    pub fn build(self) -> Result<Pipeline, DefinitionError> {
        let mut previous = self.input.clone();
        let mut steps = Vec::with_capacity(self.links.len());

        for link in self.links {
            // Escaped `{{key}}` is literal text, so only a parsed placeholder counts
            let mentions_previous = PromptTemplate::parse(&link.instruction)
                .is_ok_and(|template| template.placeholders().contains(&previous));
            let instruction = if mentions_previous {
                link.instruction
            } else {
                format!("{}\n\n{{{previous}}}", link.instruction)
            };

            let mut builder = Step::builder(link.name, Arc::clone(&self.generator))
                .instruction(instruction)
                .reads(previous.clone())
                .output_key(link.output.clone());
            if let Some(required) = link.required {
                builder = builder.structured(required);
            }
            if let Some(temperature) = self.temperature {
                builder = builder.temperature(temperature);
            }
            steps.push(builder.build()?);
            previous = link.output;
        }

        tracing::debug!(chain = %self.name, links = steps.len(), "Built prompt chain");
        Pipeline::builder(self.name).input(self.input).steps(steps).build()
    }
}

/// Laptop-style hardware summary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareSpec {
    /// Processor description
    pub cpu: String,
    /// Memory size
    pub memory: String,
    /// Storage size and kind
    pub storage: String,
}

impl HardwareSpec {
    /// Read the chain's final output
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::Decode`] if the value is not a spec object.
    pub fn from_output(output: &StateValue) -> Result<Self, PatternError> {
        output.deserialize().map_err(|source| PatternError::Decode {
            key: SPEC_JSON.to_string(),
            source,
        })
    }

    /// Read the spec from a finished run's state
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the spec is absent or malformed.
    pub fn from_state(state: &SharedState) -> Result<Self, PatternError> {
        decode(state, SPEC_JSON)
    }
}

/// Two-step chain: extract technical specifications, then structure them
///
/// `text_input` → `specifications` → `spec_json` (object with `cpu`,
/// `memory`, `storage`). Runs at temperature 0.
///
/// # Errors
///
/// Returns [`DefinitionError`] only if the built-in definitions are invalid.
pub fn spec_extraction_chain(generator: Arc<dyn Generator>) -> Result<Pipeline, DefinitionError> {
    PromptChain::new("spec_extraction", generator, TEXT_INPUT)
        .then(
            "extract",
            "Extract the technical specifications from the following text:\n\n{text_input}",
            SPECIFICATIONS,
        )
        .then_structured(
            "transform",
            "Transform the following specifications into a JSON object with 'cpu', 'memory', and 'storage' as keys:\n\n{specifications}",
            SPEC_JSON,
            ["cpu", "memory", "storage"],
        )
        .temperature(0.0)
        .build()
}
