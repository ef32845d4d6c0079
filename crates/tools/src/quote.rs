//! An inspirational quote from a randomly chosen author, found by web search.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;
use umbra_core::error::ToolError;
use umbra_core::tool::{Arity, Tool};
use crate::web_search::TavilyClient;

const NAME: &str = "quote";

pub struct QuoteTool {
    search: Arc<TavilyClient>,
    sources: Vec<String>,
}

impl QuoteTool {
    pub fn new(search: Arc<TavilyClient>, sources: Vec<String>) -> Self {
        Self { search, sources }
    }

    fn pick_author(&self) -> Option<&str> {
        if self.sources.is_empty() {
            return None;
        }
        let idx = rand::rng().random_range(0..self.sources.len());
        Some(&self.sources[idx])
    }
}

fn query_for(author: &str) -> String {
    format!("profound or inspirational quote by {author} about life, work, or mindset")
}

fn format_quote(snippet: &str, author: &str) -> String {
    format!("\"{}\"\n   - {author}", snippet.trim())
}

#[async_trait]
impl Tool for QuoteTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "An inspirational quote from one of the user's favourite authors. No args."
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    async fn execute(&self, _args: Vec<String>) -> Result<Option<String>, ToolError> {
        let author = self
            .pick_author()
            .ok_or_else(|| ToolError::NotConfigured("no inspirational sources configured".into()))?;
        debug!(author, "Looking for a quote");

        let results = self.search.search(NAME, &query_for(author)).await?;
        Ok(Some(match results.first() {
            Some(first) => format_quote(first, author),
            None => "Could not find a quote today. The web is quiet.".into(),
        }))
    }
}
