//! Simulated stock price lookup

use agentflow_core::{parse_args, Tool, ToolDefinition, ToolError};
use serde::Deserialize;
use serde_json::json;

const PRICES: &[(&str, f64)] = &[("AAPL", 178.15), ("GOOGL", 1750.30), ("MSFT", 425.50)];

#[derive(Deserialize)]
struct StockPriceArgs {
    ticker: String,
}

/// Look up the simulated price for `ticker` (case-insensitive)
///
/// # Errors
///
/// Returns [`ToolError::NotFound`] for tickers without a price. A miss is
/// never reported as a zero or placeholder price.
pub fn lookup_price(ticker: &str) -> Result<f64, ToolError> {
    let normalized = ticker.trim().to_uppercase();
    PRICES
        .iter()
        .find(|(symbol, _)| *symbol == normalized)
        .map(|(_, price)| *price)
        .ok_or_else(|| ToolError::not_found("ticker", normalized))
}

/// Create the `get_stock_price` tool
///
/// Returns the price as a JSON number, e.g. `178.15`.
#[must_use]
pub fn stock_price_tool() -> Tool {
    Tool::from_fn(
        ToolDefinition {
            name: "get_stock_price".to_string(),
            description: "Fetches the latest simulated stock price for a given stock ticker symbol. \
                          Returns the price as a number, or an error if the ticker is not found."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "ticker": {
                        "type": "string",
                        "description": "Stock ticker symbol, e.g. AAPL"
                    }
                },
                "required": ["ticker"]
            }),
        },
        |args| async move {
            let args: StockPriceArgs = parse_args(args)?;
            tracing::debug!(ticker = %args.ticker, "Looking up stock price");
            lookup_price(&args.ticker).map(|price| json!(price))
        },
    )
}
