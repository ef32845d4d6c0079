//! Prompt assembly.

pub mod assembler;

pub use assembler::{AssembledPrompt, ContextAssembler};
