//! Shared state: the per-invocation map of step outputs

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::collections::BTreeMap;
use std::fmt;

/// Key into [`SharedState`]
///
/// Keys are plain identifiers so they can double as template placeholders.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    /// Create a key
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `candidate` is a valid key (`[A-Za-z_][A-Za-z0-9_]*`)
    #[must_use]
    pub fn is_valid(candidate: &str) -> bool {
        let mut chars = candidate.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for StateKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StateKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for StateKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// A value written by a step or supplied as external input
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    /// Free text
    Text(String),
    /// Structured record (e.g. a critique or a JSON transform)
    Structured(serde_json::Value),
}

impl StateValue {
    /// Text content, if this is a text value
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Structured(_) => None,
        }
    }

    /// Structured content, if this is a structured value
    #[must_use]
    pub const fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Text(_) => None,
            Self::Structured(value) => Some(value),
        }
    }

    /// Text used when substituting this value into a prompt
    ///
    /// Structured values are rendered as pretty-printed JSON.
    #[must_use]
    pub fn to_prompt_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Structured(value) => Cow::Owned(
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
            ),
        }
    }

    /// Deserialize into a typed record
    ///
    /// Text values are parsed as JSON first.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the value does not fit `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match self {
            Self::Text(text) => serde_json::from_str(text),
            Self::Structured(value) => T::deserialize(value),
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_prompt_text())
    }
}

impl From<String> for StateValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for StateValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<serde_json::Value> for StateValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

/// Per-invocation map from [`StateKey`] to [`StateValue`]
///
/// Created fresh for every pipeline invocation and discarded when it ends.
/// Iteration order is the key order, which keeps logs and tests stable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SharedState {
    values: BTreeMap<StateKey, StateValue>,
}

impl SharedState {
    /// Create an empty state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Builder: add an entry
    #[must_use]
    pub fn with(mut self, key: impl Into<StateKey>, value: impl Into<StateValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert an entry, returning the previous value if the key was set
    pub fn insert(
        &mut self,
        key: impl Into<StateKey>,
        value: impl Into<StateValue>,
    ) -> Option<StateValue> {
        self.values.insert(key.into(), value.into())
    }

    /// Look up a value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.values.get(key)
    }

    /// Look up a text value
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(StateValue::as_text)
    }

    /// Look up a value and deserialize it into `T`
    ///
    /// Returns `None` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the value does not fit `T`.
    pub fn decode<T: DeserializeOwned>(&self, key: &str) -> Option<Result<T, serde_json::Error>> {
        self.get(key).map(StateValue::deserialize)
    }

    /// Whether the key is present
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the state is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys in order
    pub fn keys(&self) -> impl Iterator<Item = &StateKey> {
        self.values.keys()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &StateValue)> {
        self.values.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for SharedState
where
    K: Into<StateKey>,
    V: Into<StateValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
