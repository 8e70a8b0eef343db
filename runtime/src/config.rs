//! Runner configuration
//!
//! An explicit struct passed to [`Runner::new`](crate::Runner::new); nothing
//! is read from the process environment implicitly.
//!
//! # Sources
//!
//! - Builder methods on [`RunnerConfig`]
//! - [`RunnerConfig::from_env`] / [`RunnerConfig::from_lookup`]
//! - [`RunnerConfig::from_toml_str`] for file-based settings (the credential
//!   always comes from the environment, never from the file)
//!
//! # Example
//!
//! ```no_run
//! use agentflow_runtime::RunnerConfig;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunnerConfig::from_env()?.with_timeout(Duration::from_secs(30));
//! config.validate()?;
//! # Ok(())
//! # }
//! ```

use agentflow_anthropic::{DEFAULT_API_URL, DEFAULT_MODEL};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the API credential
pub const CREDENTIAL_VAR: &str = "ANTHROPIC_API_KEY";
/// Environment variable overriding the model identifier
pub const MODEL_VAR: &str = "AGENTFLOW_MODEL";
/// Environment variable overriding the per-step timeout (seconds)
pub const TIMEOUT_VAR: &str = "AGENTFLOW_TIMEOUT_SECS";
/// Environment variable overriding the sampling temperature
pub const TEMPERATURE_VAR: &str = "AGENTFLOW_TEMPERATURE";
/// Environment variable overriding the tool round limit
pub const MAX_TOOL_ROUNDS_VAR: &str = "AGENTFLOW_MAX_TOOL_ROUNDS";

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The API credential is absent or blank
    #[error("missing credential: set {CREDENTIAL_VAR}")]
    MissingCredential,

    /// A field is out of range or malformed
    #[error("invalid configuration for `{field}`: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// A settings file could not be parsed
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// API credential; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The secret itself
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Settings for a [`Runner`](crate::Runner) and the Claude generator
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// API credential
    pub credential: Credential,
    /// Model identifier
    pub model: String,
    /// Bound on each step, and on each wait for a stream fragment
    pub timeout: Duration,
    /// Sampling temperature (0.0-1.0)
    pub temperature: f32,
    /// Maximum tokens per request
    pub max_tokens: u32,
    /// Maximum tool-use rounds per generation
    pub max_tool_rounds: usize,
    /// Retries for transient provider failures
    pub max_retries: usize,
    /// API base URL
    pub api_url: String,
}

/// File-based settings; every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    model: Option<String>,
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    max_tool_rounds: Option<usize>,
    max_retries: Option<usize>,
    api_url: Option<String>,
}

impl RunnerConfig {
    /// Defaults around an explicit credential
    #[must_use]
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            credential: Credential::new(credential),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
            temperature: 0.0,
            max_tokens: 4096,
            max_tool_rounds: 8,
            max_retries: 3,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Load from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if `ANTHROPIC_API_KEY` is
    /// unset or blank, and [`ConfigError::Invalid`] for malformed overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` in place of the process environment
    ///
    /// # Errors
    ///
    /// Same as [`RunnerConfig::from_env`].
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let credential = lookup(CREDENTIAL_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingCredential)?;
        let mut config = Self::new(credential);

        if let Some(model) = lookup(MODEL_VAR) {
            config.model = model;
        }
        if let Some(secs) = lookup(TIMEOUT_VAR) {
            let secs: u64 = parse_var("timeout", &secs)?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(temperature) = lookup(TEMPERATURE_VAR) {
            config.temperature = parse_var("temperature", &temperature)?;
        }
        if let Some(rounds) = lookup(MAX_TOOL_ROUNDS_VAR) {
            config.max_tool_rounds = parse_var("max_tool_rounds", &rounds)?;
        }
        Ok(config)
    }

    /// Load settings from TOML text, taking the credential from the environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys,
    /// plus anything [`RunnerConfig::from_env`] can return.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::from_toml_with_lookup(text, |name| std::env::var(name).ok())
    }

    /// [`RunnerConfig::from_toml_str`] with an explicit environment lookup
    ///
    /// Environment overrides win over file settings.
    ///
    /// # Errors
    ///
    /// Same as [`RunnerConfig::from_toml_str`].
    pub fn from_toml_with_lookup<L>(text: &str, lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let file: FileSettings =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let from_file = |name: &str| -> Option<String> {
            match name {
                MODEL_VAR => file.model.clone(),
                TIMEOUT_VAR => file.timeout_secs.map(|v| v.to_string()),
                TEMPERATURE_VAR => file.temperature.map(|v| v.to_string()),
                MAX_TOOL_ROUNDS_VAR => file.max_tool_rounds.map(|v| v.to_string()),
                _ => None,
            }
        };

        let mut config = Self::from_lookup(|name| lookup(name).or_else(|| from_file(name)))?;
        if let Some(max_tokens) = file.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(max_retries) = file.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(api_url) = file.api_url {
            config.api_url = api_url;
        }
        Ok(config)
    }

    /// Builder: set the model identifier
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builder: set the per-step timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder: set the sampling temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Builder: set the maximum tokens per request
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Builder: set the tool round limit
    #[must_use]
    pub const fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// Builder: set the retry count for transient failures
    #[must_use]
    pub const fn with_max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    /// Builder: set the API base URL
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Check every field is usable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] for a blank credential and
    /// [`ConfigError::Invalid`] naming the first out-of-range field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.credential.is_blank() {
            return Err(ConfigError::MissingCredential);
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::invalid("model", "cannot be empty"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid("timeout", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigError::invalid(
                "temperature",
                "must be between 0.0 and 1.0",
            ));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::invalid("max_tokens", "must be > 0"));
        }
        if self.max_tool_rounds == 0 {
            return Err(ConfigError::invalid("max_tool_rounds", "must be > 0"));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "api_url",
                "must start with http:// or https://",
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(field, format!("`{raw}`: {e}")))
}
