//! Turn journal: writes each handled turn into memory.

use async_trait::async_trait;
use std::sync::Arc;
use umbra_core::error::MemoryError;
use umbra_core::memory::{CATEGORY_CONVERSATION, MemoryBackend, MemoryEntry};
use umbra_core::sink::{TurnRecord, TurnSink};

/// Stores a one-line summary of every turn under the "Conversation" category,
/// where `recall` can find it later.
pub struct MemoryTurnSink {
    backend: Arc<dyn MemoryBackend>,
}

impl MemoryTurnSink {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl TurnSink for MemoryTurnSink {
    async fn record(&self, record: &TurnRecord) -> Result<(), MemoryError> {
        let mut entry = MemoryEntry::new(CATEGORY_CONVERSATION, record.summary());
        entry.created_at = record.timestamp;
        self.backend.store(entry).await?;
        Ok(())
    }
}
