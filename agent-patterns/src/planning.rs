//! Planning Pattern
//!
//! Plan first, then write from the plan. A [`Persona`] sets the voice for
//! both steps; the result renders as a two-section report.

use crate::error::PatternError;
use crate::persona::Persona;
use agentflow_core::{DefinitionError, Generator, Pipeline, SharedState, Step};
use std::fmt;
use std::sync::Arc;

/// Key holding the topic
pub const TOPIC: &str = "topic";
/// Key holding the bullet-point plan
pub const PLAN: &str = "plan";
/// Key holding the written summary
pub const SUMMARY: &str = "summary";

/// The planner-writer persona
#[must_use]
pub fn planner_writer_persona() -> Persona {
    Persona::new(
        "an Article Planner and Writer",
        "Plan and then write a concise, engaging summary on a specified topic.",
        "You are an expert technical writer and content strategist. \
         Your strength lies in creating a clear, actionable plan before writing, \
         ensuring the final summary is both informative and easy to digest.",
    )
}

/// `topic` → `plan` → `summary` in the voice of `persona`
///
/// # Errors
///
/// Returns [`DefinitionError`] only if the built-in definitions are invalid.
pub fn plan_and_write(generator: Arc<dyn Generator>, persona: &Persona) -> Result<Pipeline, DefinitionError> {
    let system = persona.system_prompt();

    let plan = Step::builder("plan", Arc::clone(&generator))
        .description("Outlines the summary as a bulleted list.")
        .system(system.clone())
        .instruction(
            "Create a bullet-point plan for a summary on the topic: '{topic}'. \
             Reply with the bulleted list only.",
        )
        .output_key(PLAN)
        .build()?;

    let write = Step::builder("write", generator)
        .description("Writes the summary from the plan.")
        .system(system)
        .instruction(
            "Write a concise and well-structured summary on the topic '{topic}' \
             based on this plan, keeping it around 200 words:\n\n{plan}",
        )
        .output_key(SUMMARY)
        .build()?;

    Pipeline::builder("plan_and_write")
        .input(TOPIC)
        .step(plan)
        .step(write)
        .build()
}

/// Plan and summary of a finished run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedReport {
    /// Bulleted plan
    pub plan: String,
    /// Summary written from the plan
    pub summary: String,
}

impl PlannedReport {
    /// Collect the report from a finished run's state
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::MissingOutput`] if either part is absent.
    pub fn from_state(state: &SharedState) -> Result<Self, PatternError> {
        let text = |key: &str| {
            state
                .get(key)
                .map(|value| value.to_prompt_text().trim().to_string())
                .ok_or_else(|| PatternError::MissingOutput { key: key.to_string() })
        };
        Ok(Self {
            plan: text(PLAN)?,
            summary: text(SUMMARY)?,
        })
    }

    /// Parse a plan-and-summary document already in report form
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if either heading is missing.
    pub fn parse(report: &str) -> Result<Self, PatternError> {
        let missing = |key: &str| PatternError::MissingOutput { key: key.to_string() };
        let (_, rest) = report.split_once("### Plan").ok_or_else(|| missing(PLAN))?;
        let (plan, summary) = rest.split_once("### Summary").ok_or_else(|| missing(SUMMARY))?;
        Ok(Self {
            plan: plan.trim().to_string(),
            summary: summary.trim().to_string(),
        })
    }
}

impl fmt::Display for PlannedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "### Plan\n{}\n\n### Summary\n{}", self.plan, self.summary)
    }
}
