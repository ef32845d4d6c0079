//! Intent-service provider implementations for Umbra.
//!
//! All providers implement the `umbra_core::Provider` trait.
//! `build_from_config` picks one based on configuration.

pub mod ollama;
pub mod openai_compat;
pub mod router;
mod status;

#[cfg(test)]
mod test_server;

pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;
pub use status::DEFAULT_HTTP_TIMEOUT_SECS;
