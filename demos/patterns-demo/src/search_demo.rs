//! Search Assistant Demo
//!
//! Answers several questions concurrently with the simulated search tool,
//! then streams one answer with its source count. Set
//! `AGENTFLOW_SEARCH_URL` to a SearxNG-compatible endpoint to add live web
//! search.
//!
//! ```bash
//! cargo run -p patterns-demo --bin search_demo
//! ```

use agentflow_core::SharedState;
use agentflow_patterns::tool_use::{ANSWER, INPUT};
use agentflow_patterns::{search_assistant, search_tools};
use agentflow_tools::{WebSearchConfig, web_search_tool};
use std::sync::Arc;

const QUESTIONS: [&str; 3] = [
    "What is the capital of France?",
    "What's the weather like in London?",
    "Tell me something about dogs.",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let demo = patterns_demo::setup()?;

    let tools = search_tools();
    if let Ok(endpoint) = std::env::var("AGENTFLOW_SEARCH_URL") {
        tracing::info!(%endpoint, "Live web search enabled");
        tools.register(web_search_tool(WebSearchConfig::new(endpoint)));
    }
    let pipeline = search_assistant(Arc::new(demo.generator()?.with_tools(tools)))?;

    println!("=== Search Assistant Demo ===");
    let inputs = QUESTIONS.map(|question| SharedState::new().with(INPUT, question));
    for (question, result) in QUESTIONS.iter().zip(demo.runner.invoke_all(&pipeline, inputs).await) {
        match result {
            Ok(state) => println!("\nQ: {question}\nA: {}", state.text(ANSWER).unwrap_or_default()),
            Err(e) => println!("\nQ: {question}\nError: {e}"),
        }
    }

    println!("\nStreaming: {}", QUESTIONS[0]);
    let (_, _, provenance) = demo
        .stream_to_stdout(&pipeline, SharedState::new().with(INPUT, QUESTIONS[0]))
        .await?;
    match provenance {
        Some(provenance) => println!("  (Source Attributions: {} sources found)", provenance.sources),
        None => println!("  (No grounding metadata found)"),
    }

    demo.finish();
    Ok(())
}
