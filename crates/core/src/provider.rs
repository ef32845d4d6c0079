//! Provider trait: the abstraction over the language-model service.
//!
//! A Provider receives the assembled system context plus the user text and
//! returns the model's raw reply. Interpreting that reply as a decision is the
//! resolver's job, not the provider's.
//!
//! Implementations: Ollama, OpenAI-compatible endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;

/// One request to the intent service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "llama3", "gpt-4o-mini")
    pub model: String,

    /// Persona, profile and tool manifest
    pub system_context: String,

    /// Conversation history plus the current utterance
    pub user_text: String,

    /// Temperature (0.0 = deterministic)
    #[serde(default)]
    pub temperature: f32,
}

/// The raw reply from the intent service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Raw text as produced by the model
    pub content: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// The core Provider trait.
///
/// The resolver calls `complete()` without knowing which backend is in use.
/// Implementations must map every transport problem (unreachable, non-2xx,
/// timeout) into a `ProviderError`; they never panic.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "ollama", "openai").
    fn name(&self) -> &str;

    /// Send a request and get the complete raw response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Provider for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                content: request.user_text,
                model: request.model,
            })
        }
    }

    #[tokio::test]
    async fn default_health_check_is_ok() {
        assert!(Echo.health_check().await.unwrap());
    }

    #[test]
    fn request_temperature_defaults_to_zero() {
        let req: ProviderRequest = serde_json::from_str(
            r#"{"model":"llama3","system_context":"s","user_text":"u"}"#,
        )
        .unwrap();
        assert_eq!(req.temperature, 0.0);
    }
}
