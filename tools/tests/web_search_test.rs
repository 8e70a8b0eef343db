//! `web_search` against a mock SearxNG endpoint

#![allow(clippy::unwrap_used)] // Test code

use agentflow_tools::{web_search_tool, ToolError, ToolRegistry, WebSearchConfig};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> WebSearchConfig {
    WebSearchConfig::new(format!("{}/search", server.uri())).with_max_results(2)
}

#[tokio::test]
async fn test_returns_capped_hits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust async"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"title": "Tokio", "url": "https://tokio.rs", "content": "Async runtime"},
                {"title": "Async Book", "url": "https://rust-lang.github.io/async-book/", "content": "Guide"},
                {"title": "Third", "url": "https://example.com", "content": "Dropped"}
            ]
        })))
        .mount(&server)
        .await;

    let registry = ToolRegistry::with_tools([web_search_tool(config(&server))]);
    let hits = registry
        .execute("web_search", json!({"query": "rust async"}))
        .await
        .unwrap();

    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["title"], json!("Tokio"));
}

#[tokio::test]
async fn test_empty_results_are_valid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let hits = web_search_tool(config(&server))
        .call(json!({"query": "zzqqxx"}))
        .await
        .unwrap();
    assert_eq!(hits, json!([]));
}

#[tokio::test]
async fn test_upstream_failure_is_tool_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = web_search_tool(config(&server))
        .call(json!({"query": "anything"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Failed(ref m) if m.contains("503")));
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": []}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let err = web_search_tool(config(&server).with_timeout(Duration::from_millis(100)))
        .call(json!({"query": "slow"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Failed(_)));
}
