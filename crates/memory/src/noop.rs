//! No-op memory backend: disables persistent memory entirely.

use async_trait::async_trait;
use umbra_core::error::MemoryError;
use umbra_core::memory::{MemoryBackend, MemoryEntry, MemoryQuery};

/// A memory backend that stores nothing.
pub struct NoopMemory;

#[async_trait]
impl MemoryBackend for NoopMemory {
    fn name(&self) -> &str { "none" }

    async fn store(&self, _entry: MemoryEntry) -> Result<String, MemoryError> {
        Ok(String::new())
    }

    async fn search(&self, _query: MemoryQuery) -> Result<Vec<MemoryEntry>, MemoryError> {
        Ok(Vec::new())
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<MemoryEntry>, MemoryError> {
        Ok(Vec::new())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(0)
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        Ok(())
    }
}
