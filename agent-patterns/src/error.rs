//! Errors reading typed results out of pattern outputs

use thiserror::Error;

/// A pattern's output could not be read as its typed result
#[derive(Debug, Error)]
pub enum PatternError {
    /// The expected key is absent from the final state
    #[error("output `{key}` is missing")]
    MissingOutput {
        /// Key that was expected
        key: String,
    },

    /// The value does not have the expected shape
    #[error("output `{key}` has an unexpected shape: {source}")]
    Decode {
        /// Key that was read
        key: String,
        /// Underlying cause
        #[source]
        source: serde_json::Error,
    },
}

/// Read `key` from `state` as a `T`
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    state: &agentflow_core::SharedState,
    key: &str,
) -> Result<T, PatternError> {
    state
        .decode(key)
        .ok_or_else(|| PatternError::MissingOutput { key: key.to_string() })?
        .map_err(|source| PatternError::Decode {
            key: key.to_string(),
            source,
        })
}
