//! SQLite memory backend.
//!
//! One table, `memories`, holding category, content and an RFC 3339
//! timestamp. Search is a case-insensitive `LIKE` match, newest first.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};
use umbra_core::error::MemoryError;
use umbra_core::memory::{MemoryBackend, MemoryEntry, MemoryQuery};
use uuid::Uuid;
use crate::pool::{like_pattern, open_pool};

/// A SQLite memory backend.
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Create a new SQLite backend from a file path.
    ///
    /// The database and table are created automatically. Pass
    /// `"sqlite::memory:"` for an ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, MemoryError> {
        let pool = open_pool(path).await?;
        let backend = Self::from_pool(pool).await?;
        info!("SQLite memory backend initialized at {path}");
        Ok(backend)
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, MemoryError> {
        let backend = Self { pool };
        backend.run_migrations().await?;
        Ok(backend)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memories (
                iid          INTEGER PRIMARY KEY AUTOINCREMENT,
                id           TEXT UNIQUE NOT NULL,
                category     TEXT NOT NULL,
                content      TEXT NOT NULL,
                created_at   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("memories table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_memories_created_at ON memories(created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("created_at index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<MemoryEntry, MemoryError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| MemoryError::QueryFailed(format!("id column: {e}")))?;
        let category: String = row
            .try_get("category")
            .map_err(|e| MemoryError::QueryFailed(format!("category column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| MemoryError::QueryFailed(format!("content column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| MemoryError::QueryFailed(format!("created_at column: {e}")))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(MemoryEntry {
            id,
            category,
            content,
            created_at,
        })
    }
}

#[async_trait]
impl MemoryBackend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn store(&self, mut entry: MemoryEntry) -> Result<String, MemoryError> {
        if entry.id.is_empty() {
            entry.id = Uuid::new_v4().to_string();
        }

        sqlx::query(
            "INSERT INTO memories (id, category, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&entry.id)
        .bind(&entry.category)
        .bind(&entry.content)
        .bind(entry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("INSERT failed: {e}")))?;

        debug!(id = %entry.id, category = %entry.category, "Stored memory");
        Ok(entry.id)
    }

    async fn search(&self, query: MemoryQuery) -> Result<Vec<MemoryEntry>, MemoryError> {
        if query.text.trim().is_empty() {
            return self.recent(query.limit).await;
        }

        let rows = sqlx::query(
            r#"
            SELECT id, category, content, created_at FROM memories
            WHERE content LIKE ?1 ESCAPE '\'
              AND (?2 IS NULL OR category = ?2)
            ORDER BY created_at DESC, iid DESC
            LIMIT ?3
            "#,
        )
        .bind(like_pattern(&query.text))
        .bind(query.category.as_deref())
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("LIKE search: {e}")))?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn recent(&self, limit: usize) -> Result<Vec<MemoryEntry>, MemoryError> {
        let rows = sqlx::query(
            "SELECT id, category, content, created_at FROM memories \
             ORDER BY created_at DESC, iid DESC LIMIT ?1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("Recent: {e}")))?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM memories")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("Count: {e}")))?;
        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| MemoryError::QueryFailed(format!("Count column: {e}")))?;
        Ok(cnt as usize)
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        sqlx::query("DELETE FROM memories")
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::Storage(format!("Clear: {e}")))?;
        Ok(())
    }
}
