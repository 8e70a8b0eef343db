//! Prometheus metrics for pipeline runs.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed. [`MetricsExporter`] installs the Prometheus
//! recorder and renders the text exposition format.
//!
//! # Example
//!
//! ```rust,no_run
//! use agentflow_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = MetricsExporter::install()?;
//! // ... run pipelines ...
//! println!("{}", exporter.render());
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build the exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install the global recorder
    #[error("Failed to install metrics recorder: {0}")]
    Install(String),
}

/// Installed Prometheus recorder.
#[derive(Clone)]
pub struct MetricsExporter {
    handle: PrometheusHandle,
}

impl MetricsExporter {
    /// Describe all metrics and install the Prometheus recorder globally.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Install`] if a recorder is already installed.
    pub fn install() -> Result<Self, MetricsError> {
        describe_metrics();

        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        tracing::info!("Prometheus metrics recorder installed");
        Ok(Self { handle })
    }

    /// Current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl std::fmt::Debug for MetricsExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsExporter").finish_non_exhaustive()
    }
}

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        "agentflow_steps_started_total",
        "Total number of steps started"
    );
    describe_counter!(
        "agentflow_steps_completed_total",
        "Total number of steps that wrote their output"
    );
    describe_counter!(
        "agentflow_steps_failed_total",
        "Total number of steps that failed"
    );
    describe_histogram!(
        "agentflow_step_duration_seconds",
        "Time taken by each step"
    );
    describe_counter!(
        "agentflow_tool_calls_total",
        "Tool calls made by the Claude generator, by tool and outcome"
    );
    describe_counter!(
        "agentflow_retry_attempts_total",
        "Retries of transient provider failures"
    );
    describe_counter!(
        "agentflow_retries_exhausted_total",
        "Requests that failed after all retries"
    );
}

/// Step metrics recorder.
pub struct StepMetrics;

impl StepMetrics {
    /// Record a step start.
    pub fn record_start(pipeline: &str, step: &str) {
        counter!(
            "agentflow_steps_started_total",
            "pipeline" => pipeline.to_string(),
            "step" => step.to_string()
        )
        .increment(1);
    }

    /// Record a completed step.
    pub fn record_completion(pipeline: &str, step: &str, duration: Duration) {
        counter!(
            "agentflow_steps_completed_total",
            "pipeline" => pipeline.to_string(),
            "step" => step.to_string()
        )
        .increment(1);
        histogram!(
            "agentflow_step_duration_seconds",
            "pipeline" => pipeline.to_string(),
            "step" => step.to_string()
        )
        .record(duration.as_secs_f64());
    }

    /// Record a failed step.
    pub fn record_failure(pipeline: &str, step: &str) {
        counter!(
            "agentflow_steps_failed_total",
            "pipeline" => pipeline.to_string(),
            "step" => step.to_string()
        )
        .increment(1);
    }
}

/// Tool call metrics recorder.
pub struct ToolMetrics;

impl ToolMetrics {
    /// Record a tool call and whether it succeeded.
    pub fn record_call(tool: &str, ok: bool) {
        counter!(
            "agentflow_tool_calls_total",
            "tool" => tool.to_string(),
            "outcome" => if ok { "ok" } else { "error" }
        )
        .increment(1);
    }
}
