//! Pipelines: ordered, validated compositions of steps
//!
//! ## Pattern
//!
//! 1. Declare the external input keys
//! 2. Add steps in execution order
//! 3. `build()` checks every input is produced before it is read
//! 4. `run()` executes steps strictly in order, stopping at the first failure
//!
//! ## Example
//!
//! ```ignore
//! let pipeline = Pipeline::builder("WriteAndReview_Pipeline")
//!     .input("subject")
//!     .step(draft_writer)
//!     .step(fact_checker)
//!     .build()?;
//!
//! let state = pipeline.run(SharedState::new().with("subject", "tides")).await?;
//! ```

use crate::error::{DefinitionError, DefinitionFault, FlowError};
use crate::state::{SharedState, StateKey, StateValue};
use crate::step::Step;
use std::collections::HashSet;
use tracing::Instrument;

/// Ordered sequence of steps with validated data flow
#[derive(Clone, Debug)]
pub struct Pipeline {
    name: String,
    inputs: Vec<StateKey>,
    steps: Vec<Step>,
    output: StateKey,
}

impl Pipeline {
    /// Start building a pipeline
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder {
            name: name.into(),
            inputs: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Pipeline name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// External input keys
    #[must_use]
    pub fn inputs(&self) -> &[StateKey] {
        &self.inputs
    }

    /// Steps in execution order
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Output key of the last step
    #[must_use]
    pub const fn output_key(&self) -> &StateKey {
        &self.output
    }

    /// The final step's value in `state`
    #[must_use]
    pub fn output<'s>(&self, state: &'s SharedState) -> Option<&'s StateValue> {
        state.get(self.output_key().as_str())
    }

    /// Run every step in declared order
    ///
    /// # Errors
    ///
    /// Returns the first step failure; remaining steps are not executed and
    /// no partial state is returned.
    pub async fn run(&self, input: SharedState) -> Result<SharedState, FlowError> {
        let mut state = input;
        for step in &self.steps {
            let span = tracing::info_span!(
                "step",
                pipeline = %self.name,
                step = %step.name(),
                session = %step.options().session.as_ref().map(ToString::to_string).unwrap_or_default(),
            );
            let (_, next) = step.execute(state).instrument(span).await.inspect_err(|e| {
                tracing::warn!(pipeline = %self.name, error = %e, "Pipeline aborted");
            })?;
            state = next;
        }
        Ok(state)
    }
}

/// Builder for [`Pipeline`]
pub struct PipelineBuilder {
    name: String,
    inputs: Vec<StateKey>,
    steps: Vec<Step>,
}

impl PipelineBuilder {
    /// Declare an external input key
    #[must_use]
    pub fn input(mut self, key: impl Into<StateKey>) -> Self {
        self.inputs.push(key.into());
        self
    }

    /// Append a step
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append several steps
    #[must_use]
    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Validate the step graph and build the pipeline
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError`] when the pipeline is empty, a step name or
    /// output key repeats, or a step reads a key that is not produced earlier
    /// (forward, circular or unresolved reference).
    pub fn build(self) -> Result<Pipeline, DefinitionError> {
        let fault = |fault| DefinitionError::new(self.name.clone(), fault);

        if self.steps.is_empty() {
            return Err(fault(DefinitionFault::Empty));
        }
        if let Some(key) = self.inputs.iter().find(|key| !StateKey::is_valid(key.as_str())) {
            return Err(fault(DefinitionFault::InvalidKey {
                key: key.to_string(),
            }));
        }

        let mut available: HashSet<&StateKey> = HashSet::new();
        for key in &self.inputs {
            if !available.insert(key) {
                return Err(fault(DefinitionFault::DuplicateOutput {
                    step: "<input>".to_string(),
                    key: key.clone(),
                }));
            }
        }

        let mut names: HashSet<&str> = HashSet::new();
        for (index, step) in self.steps.iter().enumerate() {
            if !names.insert(step.name()) {
                return Err(fault(DefinitionFault::DuplicateStep {
                    step: step.name().to_string(),
                }));
            }

            for key in step.inputs() {
                if available.contains(key) {
                    continue;
                }
                let producer = self.steps[index..]
                    .iter()
                    .find(|later| later.output_key() == key);
                return Err(fault(match producer {
                    Some(producer) => DefinitionFault::ForwardReference {
                        step: step.name().to_string(),
                        key: key.clone(),
                        producer: producer.name().to_string(),
                    },
                    None => DefinitionFault::UnresolvedInput {
                        step: step.name().to_string(),
                        key: key.clone(),
                    },
                }));
            }

            if !available.insert(step.output_key()) {
                return Err(fault(DefinitionFault::DuplicateOutput {
                    step: step.name().to_string(),
                    key: step.output_key().clone(),
                }));
            }
        }

        let output = self.steps[self.steps.len() - 1].output_key().clone();
        Ok(Pipeline {
            name: self.name,
            inputs: self.inputs,
            steps: self.steps,
            output,
        })
    }
}
