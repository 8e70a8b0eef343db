//! Planning Pattern Demo
//!
//! Plans a short summary, then writes it from the plan.
//!
//! ```bash
//! cargo run -p patterns-demo --bin planning_demo
//! ```

use agentflow_core::SharedState;
use agentflow_patterns::planning::{TOPIC, planner_writer_persona};
use agentflow_patterns::{PlannedReport, plan_and_write};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let demo = patterns_demo::setup()?;
    let topic = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "The importance of Reinforcement Learning in AI".to_string());
    let pipeline = plan_and_write(Arc::new(demo.generator()?), &planner_writer_persona())?;

    println!("## Running the planning and writing task ##");
    let state = demo
        .runner
        .invoke(&pipeline, SharedState::new().with(TOPIC, topic))
        .await?;

    println!("\n---\n## Task Result ##\n---");
    println!("{}", PlannedReport::from_state(&state)?);

    demo.finish();
    Ok(())
}
