//! Tool Use Pattern
//!
//! A single step whose collaborator may call tools before answering. The
//! pipelines here only describe the task; the tools travel with the
//! collaborator (for example a Claude generator given [`financial_tools`]).

use crate::persona::Persona;
use agentflow_core::{DefinitionError, Generator, Pipeline, Step};
use agentflow_tools::{ToolRegistry, search_information_tool, stock_price_tool};
use std::sync::Arc;

/// Key holding the user's request
pub const INPUT: &str = "input";
/// Key holding the final answer
pub const ANSWER: &str = "answer";

/// Default request for [`financial_analyst`]
pub const AAPL_PRICE_TASK: &str = "What is the current simulated stock price for Apple (ticker: AAPL)?";

/// The analyst persona
#[must_use]
pub fn financial_analyst_persona() -> Persona {
    Persona::new(
        "a Senior Financial Analyst",
        "Analyze stock data using provided tools and report key prices.",
        "You are an experienced financial analyst adept at using data sources to find stock information. You provide clear, direct answers.",
    )
}

/// Tools for [`financial_analyst`]
#[must_use]
pub fn financial_tools() -> ToolRegistry {
    ToolRegistry::with_tools([stock_price_tool()])
}

/// Tools for [`search_assistant`]
#[must_use]
pub fn search_tools() -> ToolRegistry {
    ToolRegistry::with_tools([search_information_tool()])
}

/// Stock-price question answered by the analyst persona
///
/// `input` → `answer`. The instruction asks for one sentence and an explicit
/// statement when a price cannot be retrieved.
///
/// # Errors
///
/// Returns [`DefinitionError`] only if the built-in definitions are invalid.
pub fn financial_analyst(generator: Arc<dyn Generator>) -> Result<Pipeline, DefinitionError> {
    let step = Step::builder("financial_analyst", generator)
        .description("Answers stock price questions with the price lookup tool.")
        .system(financial_analyst_persona().system_prompt())
        .instruction(
            "{input}\n\n\
             Use the stock price lookup tool to find it. \
             If the ticker is not found, you must report that you were unable to retrieve the price.\n\n\
             Answer with a single, clear sentence stating the simulated stock price, \
             for example: 'The simulated stock price for AAPL is $178.15.'",
        )
        .output_key(ANSWER)
        .temperature(0.0)
        .build()?;

    Pipeline::builder("financial_analysis").input(INPUT).step(step).build()
}

/// General question answered with the search tool
///
/// # Errors
///
/// Returns [`DefinitionError`] only if the built-in definitions are invalid.
pub fn search_assistant(generator: Arc<dyn Generator>) -> Result<Pipeline, DefinitionError> {
    let step = Step::builder("search_assistant", generator)
        .description("Answers questions using the information search tool.")
        .system("You are a helpful assistant.")
        .instruction("{input}")
        .output_key(ANSWER)
        .temperature(0.0)
        .build()?;

    Pipeline::builder("search_assistant").input(INPUT).step(step).build()
}
