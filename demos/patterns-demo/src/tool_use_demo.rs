//! Tool Use Pattern Demo
//!
//! A financial analyst persona answers with the stock price lookup tool.
//! Try a ticker the tool does not know to see the failure reported back.
//!
//! ```bash
//! cargo run -p patterns-demo --bin tool_use_demo -- "What is the price of MSFT and NVDA?"
//! ```

use agentflow_core::SharedState;
use agentflow_patterns::tool_use::{AAPL_PRICE_TASK, INPUT};
use agentflow_patterns::{financial_analyst, financial_tools};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let demo = patterns_demo::setup()?;
    let task = std::env::args()
        .nth(1)
        .unwrap_or_else(|| AAPL_PRICE_TASK.to_string());
    let generator = demo.generator()?.with_tools(financial_tools());
    let pipeline = financial_analyst(Arc::new(generator))?;

    println!("=== Tool Use Pattern Demo ===");
    println!("Task: {task}");

    let (_, _, provenance) = demo
        .stream_to_stdout(&pipeline, SharedState::new().with(INPUT, task))
        .await?;
    if let Some(provenance) = provenance {
        println!("(successful tool calls: {})", provenance.sources);
    }

    demo.finish();
    Ok(())
}
