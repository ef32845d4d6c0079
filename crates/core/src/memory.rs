//! Memory trait: the timestamped journal behind the `log` and `recall` tools.
//!
//! Entries carry a category ("Manual Log", "Conversation", ...) and free
//! text. Search is a case-insensitive substring match, newest first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::MemoryError;

/// Category used by the `log` tool.
pub const CATEGORY_MANUAL: &str = "Manual Log";

/// Category used for automatically journaled turns.
pub const CATEGORY_CONVERSATION: &str = "Conversation";

/// A single memory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Unique ID for this memory
    pub id: String,

    /// Free-form grouping label
    pub category: String,

    /// The content of the memory
    pub content: String,

    /// When this memory was created
    pub created_at: DateTime<Utc>,
}

impl MemoryEntry {
    /// A new entry stamped now. The ID is assigned by the backend on store.
    pub fn new(category: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            category: category.into(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// A query for searching memories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryQuery {
    /// Substring to look for (case-insensitive)
    pub text: String,

    /// Maximum number of results
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Restrict to one category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

fn default_limit() -> usize {
    10
}

impl MemoryQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: default_limit(),
            category: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Whether `entry` satisfies this query. Shared by non-SQL backends.
    pub fn matches(&self, entry: &MemoryEntry) -> bool {
        if let Some(category) = &self.category
            && &entry.category != category
        {
            return false;
        }
        entry
            .content
            .to_lowercase()
            .contains(&self.text.to_lowercase())
    }
}

/// The core MemoryBackend trait.
///
/// Implementations: SQLite, in-memory (for testing), none (no-op).
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory", "none").
    fn name(&self) -> &str;

    /// Store a new memory entry, returning its ID.
    async fn store(&self, entry: MemoryEntry) -> std::result::Result<String, MemoryError>;

    /// Search memories by query, newest first.
    async fn search(&self, query: MemoryQuery) -> std::result::Result<Vec<MemoryEntry>, MemoryError>;

    /// The most recent entries, newest first.
    async fn recent(&self, limit: usize) -> std::result::Result<Vec<MemoryEntry>, MemoryError>;

    /// Get total memory count.
    async fn count(&self) -> std::result::Result<usize, MemoryError>;

    /// Clear all memories.
    async fn clear(&self) -> std::result::Result<(), MemoryError>;
}
