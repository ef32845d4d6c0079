//! Error types for the Umbra domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the dispatch taxonomy
//! (`ErrorKind`) is what ends up in front of the user.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The top-level error type for all Umbra operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory / store errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Registry errors ---
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The service answered 2xx but the body is not the expected envelope.
    #[error("Unreadable response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} ({reason})")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Store(#[from] MemoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("A tool named '{0}' is already registered")]
    DuplicateTool(String),

    #[error("'{0}' is a reserved tool name")]
    ReservedName(String),
}

/// The dispatch error taxonomy.
///
/// Every variant is caught at the boundary that detects it and rendered into
/// a user-facing message; none of them escape the dispatch core as faults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    /// The language-model service was unreachable, answered non-2xx, or timed out.
    #[error("transport failure")]
    TransportFailure,

    /// The response looked like a structured decision but could not be parsed.
    #[error("malformed response")]
    MalformedResponse,

    /// The decision named a tool that is neither registered nor reserved.
    #[error("unknown tool")]
    UnknownTool,

    /// The decision supplied the wrong number of positional arguments.
    #[error("arity mismatch (expected {expected}, got {received})")]
    ArityMismatch { expected: usize, received: usize },

    /// The tool operation itself faulted.
    #[error("tool execution failed")]
    ToolExecutionFailed,
}

/// An `ErrorKind` plus the diagnostic detail attached where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}: {detail}")]
pub struct DispatchError {
    #[serde(flatten)]
    pub kind: ErrorKind,
    pub detail: String,
}

impl DispatchError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}
