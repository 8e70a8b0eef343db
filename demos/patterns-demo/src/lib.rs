//! Shared setup for the pattern demos
//!
//! Every demo loads `.env`, installs a tracing subscriber honoring
//! `RUST_LOG`, installs the Prometheus recorder and reads
//! [`RunnerConfig`] from the environment.

use agentflow_core::{Pipeline, Provenance, SharedState, StateValue};
use agentflow_runtime::{ClaudeGenerator, MetricsExporter, RunEvent, Runner, RunnerConfig};
use anyhow::Context;
use futures::StreamExt;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Validated runner and the metrics recorder
pub struct Demo {
    /// Validated runner
    pub runner: Runner,
    metrics: Option<MetricsExporter>,
}

/// Load environment, logging and configuration
///
/// # Errors
///
/// Fails when `ANTHROPIC_API_KEY` is absent or a setting is out of range.
pub fn setup() -> anyhow::Result<Demo> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RunnerConfig::from_env()
        .context("set ANTHROPIC_API_KEY in your shell or a .env file")?;
    let metrics = match MetricsExporter::install() {
        Ok(exporter) => Some(exporter),
        Err(e) => {
            tracing::warn!(error = %e, "Metrics disabled");
            None
        }
    };

    Ok(Demo {
        runner: Runner::new(config)?,
        metrics,
    })
}

impl Demo {
    /// Claude generator using the runner's configuration
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn generator(&self) -> anyhow::Result<ClaudeGenerator> {
        Ok(ClaudeGenerator::from_config(self.runner.config())?)
    }

    /// Run `pipeline`, printing fragments as they arrive
    ///
    /// # Errors
    ///
    /// Returns the run's failure.
    pub async fn stream_to_stdout(
        &self,
        pipeline: &Pipeline,
        input: SharedState,
    ) -> anyhow::Result<(SharedState, StateValue, Option<Provenance>)> {
        let mut events = self.runner.stream(pipeline, input);
        let mut stdout = io::stdout();

        while let Some(event) = events.next().await {
            match event? {
                RunEvent::StepStarted { step } => println!("\n--- {step} ---"),
                RunEvent::Fragment { text, .. } => {
                    print!("{text}");
                    stdout.flush()?;
                }
                RunEvent::StepCompleted { .. } => println!(),
                RunEvent::Completed {
                    state,
                    output,
                    provenance,
                } => return Ok((state, output, provenance)),
            }
        }
        anyhow::bail!("run ended without completing")
    }

    /// Log collected metrics at debug level
    pub fn finish(&self) {
        if let Some(metrics) = &self.metrics {
            tracing::debug!(metrics = %metrics.render(), "Run metrics");
        }
    }
}
