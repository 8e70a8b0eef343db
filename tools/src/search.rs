//! Information search tools
//!
//! - `search_information`: canned answers for a handful of queries
//! - `web_search`: live search against a SearxNG-compatible JSON endpoint

use agentflow_core::{parse_args, Tool, ToolDefinition, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const CANNED_ANSWERS: &[(&str, &str)] = &[
    (
        "weather in london",
        "The weather in London is currently cloudy with a temperature of 15°C.",
    ),
    ("capital of france", "The capital of France is Paris."),
    (
        "population of earth",
        "The estimated population of Earth is around 8 billion people.",
    ),
    (
        "tallest mountain",
        "Mount Everest is the tallest mountain above sea level.",
    ),
];

#[derive(Deserialize)]
struct QueryArgs {
    query: String,
}

fn query_schema(description: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": description
            }
        },
        "required": ["query"]
    })
}

/// Answer `query` from the canned fact table
///
/// The query is trimmed and lower-cased before matching.
///
/// # Errors
///
/// Returns [`ToolError::NotFound`] when no canned answer exists.
pub fn lookup_answer(query: &str) -> Result<&'static str, ToolError> {
    let normalized = query.trim().to_lowercase();
    CANNED_ANSWERS
        .iter()
        .find(|(question, _)| *question == normalized)
        .map(|(_, answer)| *answer)
        .ok_or_else(|| ToolError::not_found("information for query", normalized))
}

/// Create the `search_information` tool
#[must_use]
pub fn search_information_tool() -> Tool {
    Tool::from_fn(
        ToolDefinition {
            name: "search_information".to_string(),
            description: "Provides factual information on a specific topic. Use this tool to find \
                          answers to phrases like 'capital of france' or 'weather in london?'."
                .to_string(),
            input_schema: query_schema("The topic to look up"),
        },
        |args| async move {
            let args: QueryArgs = parse_args(args)?;
            tracing::debug!(query = %args.query, "Searching canned information");
            lookup_answer(&args.query).map(|answer| json!(answer))
        },
    )
}

/// Settings for [`web_search_tool`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebSearchConfig {
    /// Search endpoint, e.g. `http://localhost:8888/search`
    pub endpoint: String,
    /// Maximum results returned to the model
    pub max_results: usize,
    /// Per-request timeout
    pub timeout: Duration,
}

impl WebSearchConfig {
    /// Config for `endpoint` with default limits
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            max_results: 5,
            timeout: Duration::from_secs(10),
        }
    }

    /// Set the result cap
    #[must_use]
    pub const fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One web search hit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Page title
    pub title: String,
    /// Page URL
    pub url: String,
    /// Snippet
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Query the search endpoint
///
/// An empty hit list is a valid result.
///
/// # Errors
///
/// Returns [`ToolError::Failed`] for transport errors, non-success statuses
/// or an unreadable body.
pub async fn web_search(
    client: &reqwest::Client,
    config: &WebSearchConfig,
    query: &str,
) -> Result<Vec<SearchHit>, ToolError> {
    let response = client
        .get(&config.endpoint)
        .query(&[("q", query), ("format", "json")])
        .timeout(config.timeout)
        .send()
        .await
        .map_err(|e| ToolError::Failed(format!("search request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ToolError::Failed(format!("search endpoint returned {status}")));
    }

    let body: SearchResponse = response
        .json()
        .await
        .map_err(|e| ToolError::Failed(format!("unreadable search response: {e}")))?;

    Ok(body.results.into_iter().take(config.max_results).collect())
}

/// Create the `web_search` tool
///
/// Returns a JSON array of `{title, url, content}` objects.
#[must_use]
pub fn web_search_tool(config: WebSearchConfig) -> Tool {
    let client = reqwest::Client::new();
    Tool::from_fn(
        ToolDefinition {
            name: "web_search".to_string(),
            description: "Searches the web and returns the most relevant pages with a short \
                          snippet each. An empty list means nothing matched."
                .to_string(),
            input_schema: query_schema("Search query"),
        },
        move |args| {
            let client = client.clone();
            let config = config.clone();
            async move {
                let args: QueryArgs = parse_args(args)?;
                let hits = web_search(&client, &config, &args.query).await?;
                tracing::debug!(query = %args.query, hits = hits.len(), "Web search completed");
                serde_json::to_value(hits).map_err(|e| ToolError::Failed(e.to_string()))
            }
        },
    )
}
