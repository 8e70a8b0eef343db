//! Prompt Chaining Pattern Demo
//!
//! Extracts technical specifications from a product blurb, then turns them
//! into a JSON object with `cpu`, `memory` and `storage`.
//!
//! ```bash
//! cargo run -p patterns-demo --bin prompt_chain_demo
//! ```

use agentflow_core::SharedState;
use agentflow_patterns::prompt_chain::TEXT_INPUT;
use agentflow_patterns::{HardwareSpec, spec_extraction_chain};
use std::sync::Arc;

const LAPTOP: &str =
    "The new laptop model features a 3.5 GHz octa-core processor, 16GB of RAM, and a 1TB NVMe SSD.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let demo = patterns_demo::setup()?;
    let pipeline = spec_extraction_chain(Arc::new(demo.generator()?))?;

    println!("=== Prompt Chaining Pattern Demo ===\n");
    println!("Input: {LAPTOP}");

    let output = demo
        .runner
        .invoke_output(&pipeline, SharedState::new().with(TEXT_INPUT, LAPTOP))
        .await?;
    let spec = HardwareSpec::from_output(&output)?;

    println!("\n--- Final JSON Output ---");
    println!("{}", serde_json::to_string_pretty(&spec)?);

    demo.finish();
    Ok(())
}
