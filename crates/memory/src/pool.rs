//! SQLite pool setup shared by the memory journal and the travel store.

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;
use umbra_core::error::MemoryError;

/// Open (creating if missing) a SQLite database.
///
/// Accepts a plain file path, a `sqlite:` URL, or `sqlite::memory:`. Each
/// connection to an in-memory database sees its own empty database, so those
/// pools are capped at one connection.
pub async fn open_pool(path: &str) -> Result<SqlitePool, MemoryError> {
    let url = if path.starts_with("sqlite:") {
        path.to_string()
    } else {
        format!("sqlite://{path}")
    };
    let in_memory = url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(&url)
        .map_err(|e| MemoryError::Storage(format!("Invalid SQLite path: {e}")))?
        .create_if_missing(true)
        .synchronous(SqliteSynchronous::Normal);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 4 })
        .connect_with(options)
        .await
        .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))
}

/// Create the parent directory of a database file if needed.
pub fn ensure_parent_dir(path: &std::path::Path) -> Result<(), MemoryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MemoryError::Storage(format!("{}: {e}", parent.display())))?;
        }
    }
    Ok(())
}

/// Escape `%`, `_` and `\` for use inside a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
