//! `recall`: keyword search over long-term memory.

use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;
use umbra_core::error::ToolError;
use umbra_core::memory::{MemoryBackend, MemoryEntry, MemoryQuery};
use umbra_core::tool::{Arity, Tool};

/// Most entries a single recall will list.
const RECALL_LIMIT: usize = 50;

pub struct RecallTool {
    backend: Arc<dyn MemoryBackend>,
}

impl RecallTool {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self { backend }
    }
}

fn format_matches(keyword: &str, entries: &[MemoryEntry]) -> String {
    if entries.is_empty() {
        return format!("No memories found containing the keyword: '{keyword}'");
    }
    let mut out = format!("Found {} memories containing '{keyword}':", entries.len());
    for entry in entries {
        let when = entry.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
        out.push_str(&format!("\n- [{when}] {}", entry.content));
    }
    out
}

#[async_trait]
impl Tool for RecallTool {
    fn name(&self) -> &str {
        "recall"
    }

    fn description(&self) -> &str {
        "Search long-term memory (notes and past conversations) for a keyword. Args: [keyword]."
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    async fn execute(&self, args: Vec<String>) -> Result<Option<String>, ToolError> {
        let keyword = args.into_iter().next().unwrap_or_default();
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ToolError::InvalidArguments("recall needs a keyword".into()));
        }

        let entries = self
            .backend
            .search(MemoryQuery::new(keyword).with_limit(RECALL_LIMIT))
            .await?;
        Ok(Some(format_matches(keyword, &entries)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::memory::CATEGORY_MANUAL;
    use umbra_memory::InMemoryBackend;

    #[tokio::test]
    async fn lists_matches_with_timestamps() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.store(MemoryEntry::new(CATEGORY_MANUAL, "Sister's birthday is June 4")).await.unwrap();
        backend.store(MemoryEntry::new(CATEGORY_MANUAL, "Renew passport")).await.unwrap();

        let out = RecallTool::new(backend)
            .execute(vec!["birthday".into()])
            .await
            .unwrap()
            .unwrap();

        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("Found 1 memories containing 'birthday':"));
        let line = lines.next().unwrap();
        assert!(line.starts_with("- ["));
        assert!(line.ends_with("] Sister's birthday is June 4"));
    }

    #[tokio::test]
    async fn no_matches_message() {
        let out = RecallTool::new(Arc::new(InMemoryBackend::new()))
            .execute(vec!["boat".into()])
            .await
            .unwrap();
        assert_eq!(out.as_deref(), Some("No memories found containing the keyword: 'boat'"));
    }
}
