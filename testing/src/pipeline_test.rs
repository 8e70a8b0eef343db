//! Ergonomic testing utilities for pipelines
//!
//! This module provides a fluent API for testing pipelines with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // PipelineTest is the natural name

use agentflow_core::{FlowError, Pipeline, SharedState, StateKey, StateValue};

/// Type alias for state assertion functions
type StateAssertion = Box<dyn FnOnce(&SharedState)>;

/// Type alias for output assertion functions
type OutputAssertion = Box<dyn FnOnce(&StateValue)>;

/// Type alias for error assertion functions
type ErrorAssertion = Box<dyn FnOnce(&FlowError)>;

/// Fluent API for testing pipelines with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use agentflow_testing::PipelineTest;
///
/// PipelineTest::new(&pipeline)
///     .given_input("text_input", "16GB of RAM, 1TB SSD")
///     .then_state(|state| {
///         assert!(state.contains("specifications"));
///     })
///     .then_output(|output| {
///         assert_eq!(output.as_structured().unwrap()["memory"], "16GB");
///     })
///     .run()
///     .await;
/// ```
pub struct PipelineTest<'p> {
    pipeline: &'p Pipeline,
    input: SharedState,
    state_assertions: Vec<StateAssertion>,
    output_assertions: Vec<OutputAssertion>,
    error_assertions: Vec<ErrorAssertion>,
}

impl<'p> PipelineTest<'p> {
    /// Create a new pipeline test with an empty input state
    #[must_use]
    pub fn new(pipeline: &'p Pipeline) -> Self {
        Self {
            pipeline,
            input: SharedState::new(),
            state_assertions: Vec::new(),
            output_assertions: Vec::new(),
            error_assertions: Vec::new(),
        }
    }

    /// Seed one input value (Given)
    #[must_use]
    pub fn given_input(mut self, key: impl Into<StateKey>, value: impl Into<StateValue>) -> Self {
        self.input.insert(key, value);
        self
    }

    /// Replace the whole input state (Given)
    #[must_use]
    pub fn given_state(mut self, state: SharedState) -> Self {
        self.input = state;
        self
    }

    /// Add an assertion about the final state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&SharedState) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the pipeline's output value (Then)
    #[must_use]
    pub fn then_output<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&StateValue) + 'static,
    {
        self.output_assertions.push(Box::new(assertion));
        self
    }

    /// Expect the run to fail and assert about the error (Then)
    #[must_use]
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&FlowError) + 'static,
    {
        self.error_assertions.push(Box::new(assertion));
        self
    }

    /// Run the pipeline and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if the run fails while success assertions are registered, if
    /// it succeeds while error assertions are registered, or if any
    /// assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    pub async fn run(self) {
        let result = self.pipeline.run(self.input).await;

        match result {
            Ok(state) => {
                assert!(
                    self.error_assertions.is_empty(),
                    "Expected pipeline `{}` to fail, but it succeeded",
                    self.pipeline.name()
                );
                for assertion in self.state_assertions {
                    assertion(&state);
                }
                if !self.output_assertions.is_empty() {
                    let output = self.pipeline.output(&state);
                    assert!(
                        output.is_some(),
                        "Pipeline `{}` produced no `{}` output",
                        self.pipeline.name(),
                        self.pipeline.output_key()
                    );
                    if let Some(output) = output {
                        for assertion in self.output_assertions {
                            assertion(output);
                        }
                    }
                }
            }
            Err(error) => {
                assert!(
                    self.state_assertions.is_empty() && self.output_assertions.is_empty(),
                    "Pipeline `{}` failed: {error}",
                    self.pipeline.name()
                );
                for assertion in self.error_assertions {
                    assertion(&error);
                }
            }
        }
    }
}

/// Helper assertions for pipeline results
pub mod assertions {
    use agentflow_core::{FlowError, GenerationError, SharedState};

    /// Assert that `state` holds text under `key` containing `needle`
    ///
    /// # Panics
    ///
    /// Panics if the key is missing, not text, or lacks `needle`.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_text_contains(state: &SharedState, key: &str, needle: &str) {
        let text = state.text(key);
        assert!(
            text.is_some_and(|text| text.contains(needle)),
            "Expected `{key}` to contain {needle:?}, found {text:?}"
        );
    }

    /// Assert that `error` is a generation timeout
    ///
    /// # Panics
    ///
    /// Panics for any other error.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_timed_out(error: &FlowError) {
        assert!(
            matches!(
                error,
                FlowError::Generation {
                    source: GenerationError::Timeout(_),
                    ..
                }
            ),
            "Expected a generation timeout, found {error:?}"
        );
    }

    /// Assert that `error` was raised by `step`
    ///
    /// # Panics
    ///
    /// Panics if the error names a different step or none.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_failed_at(error: &FlowError, step: &str) {
        assert_eq!(error.step(), Some(step), "Unexpected failing step for {error:?}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::assertions::*;
    use super::*;
    use crate::ScriptedGenerator;
    use agentflow_core::{GenerationError, Step};
    use std::sync::Arc;

    fn two_step_pipeline(generator: Arc<ScriptedGenerator>) -> Pipeline {
        let draft = Step::builder("draft", generator.clone())
            .instruction("Draft a note about {topic}")
            .output_key("draft")
            .build()
            .unwrap();
        let polish = Step::builder("polish", generator)
            .instruction("Polish this: {draft}")
            .output_key("final")
            .build()
            .unwrap();
        Pipeline::builder("notes")
            .input("topic")
            .step(draft)
            .step(polish)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_successful_run_checks_state_and_output() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond_when("Draft", "tides are tidal")
                .respond_when("Polish", "Tides rise and fall."),
        );

        PipelineTest::new(&two_step_pipeline(generator.clone()))
            .given_input("topic", "tides")
            .then_state(|state| assert_text_contains(state, "draft", "tidal"))
            .then_output(|output| assert_eq!(output.as_text(), Some("Tides rise and fall.")))
            .run()
            .await;

        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_run_checks_error() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond_when("Draft", "tides are tidal")
                .fail_when("Polish", GenerationError::RateLimited),
        );

        PipelineTest::new(&two_step_pipeline(generator))
            .given_input("topic", "tides")
            .then_error(|error| assert_failed_at(error, "polish"))
            .run()
            .await;
    }
}
