//! Conversation turns and the bounded conversation log.
//!
//! Every handled utterance adds one `User` turn and one `Assistant` turn.
//! The log keeps only the most recent turns and renders them back into the
//! next prompt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// How many turns a session keeps by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 40;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Assistant => write!(f, "Assistant"),
        }
    }
}

/// A single entry in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// `speaker: text`
    pub fn render(&self) -> String {
        format!("{}: {}", self.speaker, self.text)
    }
}

/// Append-only history bounded to the most recent `limit` turns.
///
/// The oldest turn is evicted first. Turns are never edited after append.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    turns: VecDeque<ConversationTurn>,
    limit: usize,
}

impl ConversationLog {
    pub fn new(limit: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(limit.min(256)),
            limit,
        }
    }

    /// Append a turn, then drop the oldest turns beyond the limit.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.limit {
            self.turns.pop_front();
        }
    }

    /// Record a full exchange: one user turn, one assistant turn.
    pub fn append_exchange(&mut self, user_text: &str, assistant_text: &str) {
        self.append(ConversationTurn::user(user_text));
        self.append(ConversationTurn::assistant(assistant_text));
    }

    /// Oldest first.
    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// One `speaker: text` line per turn, oldest first.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(ConversationTurn::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
