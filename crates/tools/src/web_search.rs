//! Web search via the Tavily API.
//!
//! `TavilyClient` is shared with the quote tool, which searches for a quote
//! from a randomly chosen author.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use umbra_core::error::ToolError;
use umbra_core::tool::{Arity, Tool};
use crate::http;

const NAME: &str = "search";
const DEFAULT_BASE_URL: &str = "https://api.tavily.com/search";
const MAX_RESULTS: usize = 3;

pub struct TavilyClient {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl TavilyClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            client: http::client(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Up to three result snippets for `query`, best first.
    ///
    /// `tool` names the calling tool in any error.
    pub async fn search(&self, tool: &str, query: &str) -> Result<Vec<String>, ToolError> {
        let api_key = http::require_key(&self.api_key, "Tavily")?;
        debug!(tool, query, "Running web search");

        let body = serde_json::json!({
            "api_key": api_key,
            "query": query,
            "search_depth": "basic",
            "max_results": MAX_RESULTS,
        });

        let response = self
            .client
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::request_failed(tool, e))?;
        let response = http::check_status(tool, response).await?;

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| http::bad_payload(tool, e))?;
        Ok(snippets(data))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    content: String,
}

fn snippets(data: SearchResponse) -> Vec<String> {
    data.results
        .into_iter()
        .map(|hit| hit.content.trim().to_string())
        .filter(|c| !c.is_empty())
        .take(MAX_RESULTS)
        .collect()
}

fn format_results(results: &[String]) -> String {
    if results.is_empty() {
        return "No search results found.".into();
    }
    let mut out = String::from("Search results:");
    for r in results {
        out.push_str("\n- ");
        out.push_str(r);
    }
    out
}

pub struct SearchTool {
    client: Arc<TavilyClient>,
}

impl SearchTool {
    pub fn new(client: Arc<TavilyClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Search the web to answer a question about current events or facts. Args: [query]."
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    async fn execute(&self, args: Vec<String>) -> Result<Option<String>, ToolError> {
        let query = args.first().map(String::as_str).unwrap_or("").trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArguments("search query is empty".into()));
        }
        let results = self.client.search(NAME, query).await?;
        Ok(Some(format_results(&results)))
    }
}
