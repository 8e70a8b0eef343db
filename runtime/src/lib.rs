//! # Agentflow Runtime
//!
//! Executes [`Pipeline`](agentflow_core::Pipeline)s and provides the
//! network-backed generation collaborator.
//!
//! ## Core Components
//!
//! - **Runner**: validates configuration up front, then drives pipelines
//!   step by step with a per-step timeout (`invoke`, `invoke_output`,
//!   `invoke_all`, `stream`)
//! - **`RunnerConfig`**: explicit configuration (credential, model, timeout,
//!   temperature, tool round limit) from code, the environment or TOML
//! - **`ClaudeGenerator`**: [`Generator`](agentflow_core::Generator) over the
//!   Anthropic Messages API with an optional tool-use loop and retries
//!
//! ## Example
//!
//! ```ignore
//! use agentflow_runtime::{ClaudeGenerator, Runner, RunnerConfig};
//!
//! let config = RunnerConfig::from_env()?;
//! let generator = Arc::new(ClaudeGenerator::from_config(&config)?);
//! let runner = Runner::new(config)?;
//!
//! let pipeline = spec_extraction_chain(generator)?;
//! let state = runner.invoke(&pipeline, SharedState::new().with("text_input", text)).await?;
//! ```

/// Claude-backed generator with tool use
pub mod claude;

/// Runner configuration
pub mod config;

/// Prometheus metrics for observability
pub mod metrics;

/// Retry logic with exponential backoff
pub mod retry;

/// Pipeline execution
pub mod runner;

pub use claude::ClaudeGenerator;
pub use config::{ConfigError, Credential, RunnerConfig};
pub use metrics::{MetricsError, MetricsExporter};
pub use retry::{retry_with_predicate, RetryPolicy, RetryPolicyBuilder};
pub use runner::{RunEvent, RunStream, Runner};
