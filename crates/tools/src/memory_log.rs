//! `log`: store a note in long-term memory.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use umbra_core::error::ToolError;
use umbra_core::memory::{CATEGORY_MANUAL, MemoryBackend, MemoryEntry};
use umbra_core::tool::{Arity, Tool};

pub struct LogTool {
    backend: Arc<dyn MemoryBackend>,
}

impl LogTool {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for LogTool {
    fn name(&self) -> &str {
        "log"
    }

    fn description(&self) -> &str {
        "Save a note to long-term memory. Args: [text to remember]."
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    async fn execute(&self, args: Vec<String>) -> Result<Option<String>, ToolError> {
        let text = args.into_iter().next().unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ToolError::InvalidArguments("nothing to log".into()));
        }
        let id = self.backend.store(MemoryEntry::new(CATEGORY_MANUAL, text)).await?;
        debug!(id = %id, "Logged memory");
        Ok(None)
    }
}
