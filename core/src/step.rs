//! Steps: named units of work delegating to a generation collaborator
//!
//! A step reads its declared inputs from [`SharedState`], renders its
//! instruction template, delegates to its [`Generator`] and writes the result
//! under its output key. Steps never retry.

use crate::error::{DefinitionError, DefinitionFault, FlowError, GenerationError};
use crate::generation::{FinalResponse, GenerationOptions, GenerationStream, Generator, ResponseFormat};
use crate::session::SessionScope;
use crate::state::{SharedState, StateKey, StateValue};
use crate::template::PromptTemplate;
use std::fmt;
use std::sync::Arc;

/// What a step writes to shared state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputKind {
    /// The generated text as-is
    #[default]
    Text,
    /// A JSON object carrying at least the listed top-level fields
    Structured {
        /// Fields the object must contain
        required: Vec<String>,
    },
}

/// A named, immutable unit of work
#[derive(Clone)]
pub struct Step {
    name: String,
    description: Option<String>,
    inputs: Vec<StateKey>,
    output: StateKey,
    template: PromptTemplate,
    output_kind: OutputKind,
    options: GenerationOptions,
    generator: Arc<dyn Generator>,
}

impl Step {
    /// Start building a step
    #[must_use]
    pub fn builder(name: impl Into<String>, generator: Arc<dyn Generator>) -> StepBuilder {
        StepBuilder {
            name: name.into(),
            generator,
            description: None,
            instruction: None,
            reads: Vec::new(),
            output: None,
            output_kind: OutputKind::Text,
            options: GenerationOptions::default(),
        }
    }

    /// Step name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional human-readable description
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared input keys (template placeholders first, then extra reads)
    #[must_use]
    pub fn inputs(&self) -> &[StateKey] {
        &self.inputs
    }

    /// Output key
    #[must_use]
    pub const fn output_key(&self) -> &StateKey {
        &self.output
    }

    /// Instruction template
    #[must_use]
    pub const fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Output kind
    #[must_use]
    pub const fn output_kind(&self) -> &OutputKind {
        &self.output_kind
    }

    /// Options passed to the collaborator
    #[must_use]
    pub const fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Check inputs and render the prompt
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::MissingInput`] for the first absent input key.
    pub fn prepare(&self, state: &SharedState) -> Result<String, FlowError> {
        if let Some(key) = self.inputs.iter().find(|key| !state.contains(key.as_str())) {
            return Err(self.missing(key.clone()));
        }
        self.template.render(state).map_err(|key| self.missing(key))
    }

    /// Delegate a rendered prompt to the collaborator
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Generation`] carrying the collaborator's failure.
    pub async fn generate(&self, prompt: &str) -> Result<FinalResponse, FlowError> {
        self.generator
            .generate(prompt, &self.options)
            .await
            .map_err(|e| FlowError::generation(&self.name, e))
    }

    /// Delegate a rendered prompt to the collaborator, streaming
    #[must_use]
    pub fn stream<'a>(&'a self, prompt: &'a str) -> GenerationStream<'a> {
        self.generator.generate_stream(prompt, &self.options)
    }

    /// Parse generated text and write it under the output key
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Generation`] with
    /// [`GenerationError::MalformedOutput`] when a structured step's text is
    /// not an object with the required fields. Nothing is written then.
    pub fn complete(&self, state: &mut SharedState, text: &str) -> Result<StateValue, FlowError> {
        let value = self
            .parse_output(text)
            .map_err(|e| FlowError::generation(&self.name, e))?;
        state.insert(self.output.clone(), value.clone());
        Ok(value)
    }

    /// Execute the step against `state`
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::MissingInput`] before any delegation when an input
    /// is absent, or [`FlowError::Generation`] when the collaborator fails or
    /// returns unusable structured output.
    pub async fn execute(&self, mut state: SharedState) -> Result<(StateValue, SharedState), FlowError> {
        let prompt = self.prepare(&state)?;
        tracing::debug!(step = %self.name, prompt_len = prompt.len(), "Delegating step to generator");
        let response = self.generate(&prompt).await?;
        let value = self.complete(&mut state, &response.text)?;
        Ok((value, state))
    }

    /// Interpret generated text according to the output kind
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::MalformedOutput`] for unusable structured output.
    pub fn parse_output(&self, text: &str) -> Result<StateValue, GenerationError> {
        match &self.output_kind {
            OutputKind::Text => Ok(StateValue::Text(text.to_string())),
            OutputKind::Structured { required } => {
                let body = strip_code_fence(text);
                let value: serde_json::Value = serde_json::from_str(body)
                    .map_err(|e| GenerationError::MalformedOutput(format!("not valid JSON: {e}")))?;
                let object = value.as_object().ok_or_else(|| {
                    GenerationError::MalformedOutput("expected a JSON object".to_string())
                })?;
                if let Some(field) = required.iter().find(|field| !object.contains_key(field.as_str())) {
                    return Err(GenerationError::MalformedOutput(format!(
                        "missing field `{field}`"
                    )));
                }
                Ok(StateValue::Structured(value))
            }
        }
    }

    fn missing(&self, key: StateKey) -> FlowError {
        FlowError::MissingInput {
            step: self.name.clone(),
            key,
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .field("output_kind", &self.output_kind)
            .finish_non_exhaustive()
    }
}

/// Strip a surrounding Markdown code fence (```json ... ```)
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_end();
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    let is_tag = |line: &str| line.trim().chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    match rest.split_once('\n') {
        Some((tag, body)) if is_tag(tag) => body.trim(),
        // Tag and content share the opening line
        _ => rest
            .trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-')
            .trim(),
    }
}

/// Builder for [`Step`]
pub struct StepBuilder {
    name: String,
    generator: Arc<dyn Generator>,
    description: Option<String>,
    instruction: Option<String>,
    reads: Vec<StateKey>,
    output: Option<StateKey>,
    output_kind: OutputKind,
    options: GenerationOptions,
}

impl StepBuilder {
    /// Set the instruction template (`{key}` placeholders become inputs)
    #[must_use]
    pub fn instruction(mut self, template: impl Into<String>) -> Self {
        self.instruction = Some(template.into());
        self
    }

    /// Declare an extra input not referenced by the template
    #[must_use]
    pub fn reads(mut self, key: impl Into<StateKey>) -> Self {
        self.reads.push(key.into());
        self
    }

    /// Set the output key (defaults to the step name)
    #[must_use]
    pub fn output_key(mut self, key: impl Into<StateKey>) -> Self {
        self.output = Some(key.into());
        self
    }

    /// Expect a JSON object with the given top-level fields
    #[must_use]
    pub fn structured<I, S>(mut self, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_kind = OutputKind::Structured {
            required: required.into_iter().map(Into::into).collect(),
        };
        self
    }

    /// Set a description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the generation options
    #[must_use]
    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the model identifier
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = Some(model.into());
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    /// Set the system prompt
    #[must_use]
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.options.system = Some(system.into());
        self
    }

    /// Set the session scope
    #[must_use]
    pub fn session(mut self, session: SessionScope) -> Self {
        self.options.session = Some(session);
        self
    }

    /// Validate and build the step
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError`] when the name is empty, the instruction is
    /// missing or invalid, a key is not an identifier, or the step reads its
    /// own output.
    pub fn build(self) -> Result<Step, DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::new("<unnamed>", DefinitionFault::UnnamedStep));
        }
        let fault = |fault| DefinitionError::new(self.name.clone(), fault);

        let instruction = self
            .instruction
            .as_deref()
            .ok_or_else(|| fault(DefinitionFault::MissingInstruction))?;
        let template = PromptTemplate::parse(instruction).map_err(|e| fault(e.into()))?;

        let output = self.output.clone().unwrap_or_else(|| StateKey::new(self.name.clone()));
        for key in self.reads.iter().chain(std::iter::once(&output)) {
            if !StateKey::is_valid(key.as_str()) {
                return Err(fault(DefinitionFault::InvalidKey {
                    key: key.to_string(),
                }));
            }
        }

        let mut inputs = template.placeholders();
        for key in &self.reads {
            if !inputs.contains(key) {
                inputs.push(key.clone());
            }
        }
        if inputs.contains(&output) {
            return Err(fault(DefinitionFault::SelfReference {
                step: self.name.clone(),
                key: output,
            }));
        }

        let mut options = self.options;
        if matches!(self.output_kind, OutputKind::Structured { .. }) {
            options.response_format = ResponseFormat::Json;
        }

        Ok(Step {
            name: self.name,
            description: self.description,
            inputs,
            output,
            template,
            output_kind: self.output_kind,
            options,
            generator: self.generator,
        })
    }
}
