//! Reflection Pattern Demo
//!
//! A writer drafts a paragraph; a fact-checker reviews it.
//!
//! ```bash
//! cargo run -p patterns-demo --bin reflection_demo -- "The history of the printing press"
//! ```

use agentflow_core::SharedState;
use agentflow_patterns::reflection::{DRAFT_TEXT, SUBJECT};
use agentflow_patterns::{Critique, Verdict, write_and_review};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let demo = patterns_demo::setup()?;
    let subject = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "The Great Wall of China".to_string());
    let pipeline = write_and_review(Arc::new(demo.generator()?))?;

    println!("=== Reflection Pattern Demo ===\n");
    let state = demo
        .runner
        .invoke(&pipeline, SharedState::new().with(SUBJECT, subject))
        .await?;

    println!("Draft:\n{}\n", state.text(DRAFT_TEXT).unwrap_or_default());
    let critique = Critique::from_state(&state)?;
    let label = match critique.status {
        Verdict::Accurate => "ACCURATE",
        Verdict::Inaccurate => "INACCURATE",
    };
    println!("Review: {label}\n{}", critique.reasoning);

    demo.finish();
    Ok(())
}
