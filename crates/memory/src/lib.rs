//! Memory and store implementations for Umbra.

pub mod in_memory;
pub mod journal;
pub mod noop;
pub mod pool;
pub mod sqlite;
pub mod travel;

pub use in_memory::InMemoryBackend;
pub use journal::MemoryTurnSink;
pub use noop::NoopMemory;
pub use sqlite::SqliteBackend;
pub use travel::{Friend, PointOfInterest, TravelStore};

use std::sync::Arc;
use umbra_core::error::MemoryError;
use umbra_core::memory::MemoryBackend;

/// Build the memory backend named by `backend` ("sqlite", "in_memory", "none").
pub async fn open_backend(
    backend: &str,
    path: &std::path::Path,
) -> Result<Arc<dyn MemoryBackend>, MemoryError> {
    match backend {
        "sqlite" => {
            pool::ensure_parent_dir(path)?;
            Ok(Arc::new(SqliteBackend::new(&path.to_string_lossy()).await?))
        }
        "in_memory" => Ok(Arc::new(InMemoryBackend::new())),
        "none" => Ok(Arc::new(NoopMemory)),
        other => Err(MemoryError::Storage(format!("unknown memory backend '{other}'"))),
    }
}
