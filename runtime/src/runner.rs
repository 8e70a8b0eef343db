//! The runner: drives pipelines to completion
//!
//! A [`Runner`] owns validated configuration and executes pipelines with a
//! per-step timeout, metrics and tracing. Each invocation gets its own
//! [`SharedState`]; nothing is shared between invocations.
//!
//! ## Example
//!
//! ```ignore
//! let runner = Runner::new(RunnerConfig::from_env()?)?;
//!
//! let summary = runner
//!     .invoke_output(&pipeline, SharedState::new().with("topic", "tides"))
//!     .await?;
//!
//! let mut events = runner.stream(&pipeline, SharedState::new().with("topic", "tides"));
//! while let Some(event) = events.next().await {
//!     if let RunEvent::Fragment { text, .. } = event? {
//!         print!("{text}");
//!     }
//! }
//! ```

use crate::config::{ConfigError, RunnerConfig};
use crate::metrics::StepMetrics;
use agentflow_core::{
    FlowError, GenerationError, GenerationEvent, Pipeline, Provenance, SharedState, StateValue,
    Step,
};
use async_stream::stream;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Progress of a streamed invocation
#[derive(Clone, Debug, PartialEq)]
pub enum RunEvent {
    /// A step is about to run
    StepStarted {
        /// Step name
        step: String,
    },
    /// Generated text fragment, in generation order
    Fragment {
        /// Step producing the text
        step: String,
        /// The fragment
        text: String,
    },
    /// A step wrote its output
    StepCompleted {
        /// Step name
        step: String,
        /// Value written under the step's output key
        output: StateValue,
        /// Grounding reported by the collaborator
        provenance: Option<Provenance>,
    },
    /// The pipeline finished; always the last event of a successful run
    Completed {
        /// Final shared state
        state: SharedState,
        /// The final step's output
        output: StateValue,
        /// Grounding reported for the final step
        provenance: Option<Provenance>,
    },
}

/// Lazy stream of run events; on failure the error is the last item
pub type RunStream<'a> = Pin<Box<dyn Stream<Item = Result<RunEvent, FlowError>> + Send + 'a>>;

/// Executes pipelines under a validated configuration
#[derive(Clone, Debug)]
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// Create a runner, validating `config` up front
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] or
    /// [`ConfigError::Invalid`] before any step can execute.
    pub fn new(config: RunnerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The runner's configuration
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Bound applied to each step
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.config.timeout
    }

    fn timed_out(&self, step: &Step) -> FlowError {
        FlowError::generation(step.name(), GenerationError::Timeout(self.config.timeout))
    }

    async fn run_step(&self, pipeline: &Pipeline, step: &Step, state: &mut SharedState) -> Result<(), FlowError> {
        StepMetrics::record_start(pipeline.name(), step.name());
        let started = Instant::now();

        let result = async {
            let prompt = step.prepare(state)?;
            let response = tokio::time::timeout(self.config.timeout, step.generate(&prompt))
                .await
                .map_err(|_| self.timed_out(step))??;
            step.complete(state, &response.text)
        }
        .await;

        match result {
            Ok(_) => {
                StepMetrics::record_completion(pipeline.name(), step.name(), started.elapsed());
                tracing::debug!(elapsed_ms = started.elapsed().as_millis(), "Step completed");
                Ok(())
            }
            Err(e) => {
                StepMetrics::record_failure(pipeline.name(), step.name());
                tracing::warn!(error = %e, "Step failed");
                Err(e)
            }
        }
    }

    /// Run `pipeline` to completion
    ///
    /// Steps run strictly in declared order; the first failure aborts the
    /// run and no partial state is returned.
    ///
    /// # Errors
    ///
    /// Returns the first step's [`FlowError`], including
    /// [`GenerationError::Timeout`] when a step exceeds the configured bound.
    pub async fn invoke(&self, pipeline: &Pipeline, input: SharedState) -> Result<SharedState, FlowError> {
        let span = tracing::info_span!("pipeline", pipeline = %pipeline.name());
        async move {
            let mut state = input;
            for step in pipeline.steps() {
                let span = tracing::info_span!(
                    "step",
                    step = %step.name(),
                    session = %step.options().session.as_ref().map(ToString::to_string).unwrap_or_default(),
                );
                self.run_step(pipeline, step, &mut state).instrument(span).await?;
            }
            tracing::info!("Pipeline completed");
            Ok(state)
        }
        .instrument(span)
        .await
    }

    /// Run `pipeline` and return only the final step's output
    ///
    /// # Errors
    ///
    /// Same as [`Runner::invoke`].
    pub async fn invoke_output(&self, pipeline: &Pipeline, input: SharedState) -> Result<StateValue, FlowError> {
        let state = self.invoke(pipeline, input).await?;
        final_output(pipeline, &state)
    }

    /// Run independent invocations concurrently
    ///
    /// Each input gets its own state; results come back in input order and
    /// one failure does not affect the others.
    pub async fn invoke_all<I>(&self, pipeline: &Pipeline, inputs: I) -> Vec<Result<SharedState, FlowError>>
    where
        I: IntoIterator<Item = SharedState>,
    {
        futures::future::join_all(inputs.into_iter().map(|input| self.invoke(pipeline, input))).await
    }

    /// Run `pipeline`, streaming progress and generated fragments
    ///
    /// The stream is lazy: nothing runs until it is polled. Dropping it
    /// abandons the in-flight generation. Each wait for the next fragment is
    /// bounded by the configured timeout.
    #[must_use]
    pub fn stream<'a>(&'a self, pipeline: &'a Pipeline, input: SharedState) -> RunStream<'a> {
        let timeout = self.config.timeout;

        Box::pin(stream! {
            let mut state = input;
            let mut provenance = None;

            for step in pipeline.steps() {
                yield Ok(RunEvent::StepStarted { step: step.name().to_string() });
                StepMetrics::record_start(pipeline.name(), step.name());
                let started = Instant::now();

                let prompt = match step.prepare(&state) {
                    Ok(prompt) => prompt,
                    Err(e) => {
                        StepMetrics::record_failure(pipeline.name(), step.name());
                        yield Err(e);
                        return;
                    }
                };

                let mut fragments = step.stream(&prompt);
                let mut response = None;
                let mut failure = None;
                loop {
                    match tokio::time::timeout(timeout, fragments.next()).await {
                        Err(_) => {
                            failure = Some(self.timed_out(step));
                            break;
                        }
                        Ok(None) => break,
                        Ok(Some(Ok(GenerationEvent::Delta(text)))) => {
                            yield Ok(RunEvent::Fragment { step: step.name().to_string(), text });
                        }
                        Ok(Some(Ok(GenerationEvent::Final(done)))) => {
                            response = Some(done);
                            break;
                        }
                        Ok(Some(Err(e))) => {
                            failure = Some(FlowError::generation(step.name(), e));
                            break;
                        }
                    }
                }
                drop(fragments);

                let outcome = match (failure, response) {
                    (Some(e), _) => Err(e),
                    (None, None) => Err(FlowError::generation(step.name(), GenerationError::IncompleteStream)),
                    (None, Some(done)) => step
                        .complete(&mut state, &done.text)
                        .map(|output| (output, done.provenance)),
                };

                match outcome {
                    Ok((output, step_provenance)) => {
                        StepMetrics::record_completion(pipeline.name(), step.name(), started.elapsed());
                        provenance = step_provenance;
                        yield Ok(RunEvent::StepCompleted {
                            step: step.name().to_string(),
                            output,
                            provenance: step_provenance,
                        });
                    }
                    Err(e) => {
                        StepMetrics::record_failure(pipeline.name(), step.name());
                        tracing::warn!(pipeline = %pipeline.name(), step = %step.name(), error = %e, "Streamed step failed");
                        yield Err(e);
                        return;
                    }
                }
            }

            match final_output(pipeline, &state) {
                Ok(output) => {
                    yield Ok(RunEvent::Completed { state, output, provenance });
                }
                Err(e) => {
                    yield Err(e);
                }
            }
        })
    }
}

fn final_output(pipeline: &Pipeline, state: &SharedState) -> Result<StateValue, FlowError> {
    pipeline.output(state).cloned().ok_or_else(|| {
        let step = pipeline.steps().last().map(Step::name).unwrap_or_default();
        FlowError::MissingInput {
            step: step.to_string(),
            key: pipeline.output_key().clone(),
        }
    })
}
