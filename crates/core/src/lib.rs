//! # Umbra Core
//!
//! Domain types, traits, and error definitions for the Umbra intent-dispatch
//! layer. This crate has **zero framework dependencies**: it defines the model
//! that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here (the language-model service,
//! tool operations, the profile supplier, persistence). Implementations live in
//! their own crates, which keeps the dispatch core testable with small mocks.

pub mod decision;
pub mod error;
pub mod event;
pub mod identity;
pub mod memory;
pub mod message;
pub mod provider;
pub mod sink;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use decision::{Decision, Interpretation, RESERVED_CONVERSATION, RESERVED_ERROR};
pub use error::{DispatchError, Error, ErrorKind, Result};
pub use event::{DomainEvent, EventBus};
pub use identity::{FileProfile, ProfilePaths, ProfileSupplier, StaticProfile};
pub use memory::{MemoryBackend, MemoryEntry, MemoryQuery, CATEGORY_CONVERSATION, CATEGORY_MANUAL};
pub use message::{ConversationLog, ConversationTurn, Speaker, DEFAULT_HISTORY_LIMIT};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use sink::{TurnRecord, TurnSink};
pub use tool::{Arity, FnTool, Tool, ToolDescriptor, ToolRegistry, ToolRegistryBuilder};
