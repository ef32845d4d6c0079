//! Turn sink: where completed turns are journaled.
//!
//! Recording is best-effort. The session logs a warning when a sink fails
//! and the user still gets their reply.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::decision::Decision;
use crate::error::{DispatchError, MemoryError};

/// Everything worth keeping about one handled utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub user_text: String,
    pub decision: Decision,
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<DispatchError>,
    pub timestamp: DateTime<Utc>,
}

impl TurnRecord {
    /// `User: '..' | Thought: '..' | Action: tool(args) | Result: ..`
    pub fn summary(&self) -> String {
        let thought = self.decision.thought.as_deref().unwrap_or("");
        let args = self
            .decision
            .args
            .iter()
            .map(|a| format!("'{a}'"))
            .collect::<Vec<_>>()
            .join(", ");
        let status = if self.success { "ok" } else { "failed" };
        format!(
            "User: '{}' | Thought: '{}' | Action: {}({}) | Result ({}): {}",
            self.user_text, thought, self.decision.tool, args, status, self.output
        )
    }
}

/// A destination for completed turns.
#[async_trait]
pub trait TurnSink: Send + Sync {
    async fn record(&self, record: &TurnRecord) -> Result<(), MemoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_includes_action_and_thought() {
        let record = TurnRecord {
            user_text: "weather in Boston".into(),
            decision: Decision::new("weather", vec!["Boston".into()]).with_thought("wants weather"),
            success: true,
            output: "The weather in Boston is 61°F with clear sky.".into(),
            error: None,
            timestamp: Utc::now(),
        };
        assert_eq!(
            record.summary(),
            "User: 'weather in Boston' | Thought: 'wants weather' | Action: weather('Boston') \
             | Result (ok): The weather in Boston is 61°F with clear sky."
        );
    }

    #[test]
    fn summary_marks_failures() {
        let record = TurnRecord {
            user_text: "fly".into(),
            decision: Decision::new("fly", vec![]),
            success: false,
            output: "nope".into(),
            error: None,
            timestamp: Utc::now(),
        };
        assert!(record.summary().contains("Action: fly() | Result (failed)"));
    }
}
