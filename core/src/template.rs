//! Instruction templates with `{key}` placeholders
//!
//! Placeholders name [`StateKey`]s. Literal braces are written `{{` and `}}`.
//!
//! ```
//! use agentflow_core::{PromptTemplate, SharedState};
//!
//! let template = PromptTemplate::parse("Summarize {{briefly}}: {draft_text}").unwrap();
//! let state = SharedState::new().with("draft_text", "Rust is fast.");
//! assert_eq!(template.render(&state).unwrap(), "Summarize {briefly}: Rust is fast.");
//! ```

use crate::state::{SharedState, StateKey};
use thiserror::Error;

/// Template parse failures (byte offsets into the source)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// `{` without a closing `}`
    #[error("unclosed placeholder starting at offset {offset}")]
    UnclosedPlaceholder {
        /// Offset of the opening brace
        offset: usize,
    },

    /// `{...}` whose content is not a valid key
    #[error("invalid placeholder `{name}` at offset {offset}")]
    InvalidPlaceholder {
        /// Placeholder content
        name: String,
        /// Offset of the opening brace
        offset: usize,
    },

    /// Stray `}`
    #[error("unmatched `}}` at offset {offset}")]
    UnmatchedClosingBrace {
        /// Offset of the brace
        offset: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(StateKey),
}

/// Parsed instruction template
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse a template
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] for unclosed, invalid or unmatched braces.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' if chars.peek().map(|&(_, next)| next) == Some('{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().map(|&(_, next)| next) == Some('}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(TemplateError::UnmatchedClosingBrace { offset }),
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        name.push(inner);
                    }
                    if !closed {
                        return Err(TemplateError::UnclosedPlaceholder { offset });
                    }
                    let name = name.trim();
                    if !StateKey::is_valid(name) {
                        return Err(TemplateError::InvalidPlaceholder {
                            name: name.to_string(),
                            offset,
                        });
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(StateKey::new(name)));
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Original template text
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder keys in order of first use, without duplicates
    #[must_use]
    pub fn placeholders(&self) -> Vec<StateKey> {
        let mut keys: Vec<StateKey> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(key) = segment {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    /// Substitute placeholders from `state`
    ///
    /// # Errors
    ///
    /// Returns the first placeholder key missing from `state`.
    pub fn render(&self, state: &SharedState) -> Result<String, StateKey> {
        let mut rendered = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(key) => {
                    let value = state.get(key.as_str()).ok_or_else(|| key.clone())?;
                    rendered.push_str(&value.to_prompt_text());
                }
            }
        }
        Ok(rendered)
    }
}
