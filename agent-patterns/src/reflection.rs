//! Reflection Pattern
//!
//! A writer drafts; a fact-checker reviews the draft and returns a
//! structured critique.
//!
//! ## Pattern
//!
//! 1. `draft_writer` writes a short paragraph about `subject` → `draft_text`
//! 2. `fact_checker` verifies `draft_text` → `review_output`
//!    (`{"status": "ACCURATE" | "INACCURATE", "reasoning": "..."}`)

use crate::error::{PatternError, decode};
use agentflow_core::{DefinitionError, Generator, Pipeline, SharedState, Step};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Key holding the subject to write about
pub const SUBJECT: &str = "subject";
/// Key holding the writer's paragraph
pub const DRAFT_TEXT: &str = "draft_text";
/// Key holding the fact-checker's critique
pub const REVIEW_OUTPUT: &str = "review_output";

const FACT_CHECKER_INSTRUCTION: &str = "\
1. Read the following text:

{draft_text}

2. Carefully verify the factual accuracy of all claims.
3. Your final output must be a JSON object containing two keys:
   - \"status\": A string, either \"ACCURATE\" or \"INACCURATE\".
   - \"reasoning\": A string providing a clear explanation for your status, citing specific issues if any are found.";

/// Fact-checker's judgement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Every claim checks out
    #[serde(rename = "ACCURATE", alias = "accurate", alias = "Accurate")]
    Accurate,
    /// At least one claim is wrong
    #[serde(rename = "INACCURATE", alias = "inaccurate", alias = "Inaccurate")]
    Inaccurate,
}

/// Structured review of a draft
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Critique {
    /// Verdict
    pub status: Verdict,
    /// Explanation, citing problems if any
    pub reasoning: String,
}

impl Critique {
    /// Whether the draft passed review
    #[must_use]
    pub fn is_accurate(&self) -> bool {
        self.status == Verdict::Accurate
    }

    /// Read the critique from a finished run's state
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the review is absent or does not carry a
    /// recognised status.
    pub fn from_state(state: &SharedState) -> Result<Self, PatternError> {
        decode(state, REVIEW_OUTPUT)
    }
}

/// Writer followed by a fact-checker
///
/// # Errors
///
/// Returns [`DefinitionError`] only if the built-in definitions are invalid.
pub fn write_and_review(generator: Arc<dyn Generator>) -> Result<Pipeline, DefinitionError> {
    let writer = Step::builder("draft_writer", Arc::clone(&generator))
        .description("Generates initial draft content on a given subject.")
        .instruction("Write a short, informative paragraph about the following subject:\n\n{subject}")
        .output_key(DRAFT_TEXT)
        .build()?;

    let reviewer = Step::builder("fact_checker", generator)
        .description("Reviews a given text for factual accuracy and provides a structured critique.")
        .system("You are a meticulous fact-checker.")
        .instruction(FACT_CHECKER_INSTRUCTION)
        .output_key(REVIEW_OUTPUT)
        .structured(["status", "reasoning"])
        .build()?;

    Pipeline::builder("write_and_review")
        .input(SUBJECT)
        .step(writer)
        .step(reviewer)
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use agentflow_core::{StateKey, StateValue};
    use serde_json::json;

    #[test]
    fn test_reviewer_reads_the_draft() {
        let pipeline = write_and_review(Arc::new(agentflow_testing::ScriptedGenerator::new())).unwrap();
        let reviewer = &pipeline.steps()[1];

        assert_eq!(reviewer.inputs(), &[StateKey::new(DRAFT_TEXT)]);
        assert_eq!(reviewer.options().system.as_deref(), Some("You are a meticulous fact-checker."));
        assert_eq!(pipeline.output_key().as_str(), REVIEW_OUTPUT);

        let prompt = reviewer
            .prepare(&SharedState::new().with(DRAFT_TEXT, "Water boils at 100°C at sea level."))
            .unwrap();
        assert!(prompt.contains("Water boils at 100°C at sea level."));
        assert!(prompt.contains("\"ACCURATE\" or \"INACCURATE\""));
    }

    #[test]
    fn test_critique_accepts_either_case() {
        let state = SharedState::new().with(
            REVIEW_OUTPUT,
            StateValue::Structured(json!({"status": "inaccurate", "reasoning": "Wrong date."})),
        );
        let critique = Critique::from_state(&state).unwrap();
        assert_eq!(critique.status, Verdict::Inaccurate);
        assert!(!critique.is_accurate());
    }

    #[test]
    fn test_unknown_status_is_a_decode_error() {
        let state = SharedState::new().with(
            REVIEW_OUTPUT,
            StateValue::Structured(json!({"status": "MAYBE", "reasoning": "?"})),
        );
        assert!(matches!(Critique::from_state(&state), Err(PatternError::Decode { .. })));
    }
}
