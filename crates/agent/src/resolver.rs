//! Intent resolution: one call to the language model, one `Decision` out.
//!
//! `resolve` never fails. Transport problems and unparseable replies become a
//! decision for the reserved `error` tool, and the matching `DispatchError`
//! rides along so the dispatcher can report the right kind.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use umbra_core::decision::{Decision, Interpretation};
use umbra_core::error::{DispatchError, ErrorKind, ProviderError};
use umbra_core::provider::{Provider, ProviderRequest};
use crate::context::AssembledPrompt;

/// Default upper bound on one intent-service call.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(60);

/// What the resolver concluded for one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub decision: Decision,
    /// Set when the decision is a reserved `error` produced by the resolver.
    pub failure: Option<DispatchError>,
    pub duration_ms: u64,
}

pub struct IntentResolver {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl IntentResolver {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn resolve(&self, prompt: AssembledPrompt) -> Resolution {
        let started = Instant::now();
        let request = ProviderRequest {
            model: self.model.clone(),
            system_context: prompt.system_context,
            user_text: prompt.user_text,
            temperature: self.temperature,
        };

        let outcome = tokio::time::timeout(self.timeout, self.provider.complete(request)).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let (decision, failure) = match outcome {
            Err(_) => {
                let detail = format!(
                    "{} did not answer within {}s",
                    self.provider.name(),
                    self.timeout.as_secs()
                );
                warn!(provider = self.provider.name(), "Intent service timed out");
                transport_failure(detail)
            }
            Ok(Err(ProviderError::InvalidResponse(detail))) => {
                warn!(provider = self.provider.name(), detail = %detail, "Unreadable intent service reply");
                malformed(format!("{}: {detail}", self.provider.name()))
            }
            Ok(Err(e)) => {
                warn!(provider = self.provider.name(), error = %e, "Intent service call failed");
                transport_failure(format!("{}: {e}", self.provider.name()))
            }
            Ok(Ok(response)) => {
                debug!(model = %response.model, chars = response.content.len(), "Intent service replied");
                match Decision::interpret(&response.content) {
                    Interpretation::Malformed(diagnostic) => {
                        warn!(diagnostic = %diagnostic, "Malformed decision payload");
                        malformed(diagnostic)
                    }
                    other => (other.into_decision(), None),
                }
            }
        };

        Resolution {
            decision,
            failure,
            duration_ms,
        }
    }
}

fn transport_failure(detail: String) -> (Decision, Option<DispatchError>) {
    let decision = Decision::error(format!(
        "I can't connect to my core intelligence right now ({detail})."
    ));
    (
        decision,
        Some(DispatchError::new(ErrorKind::TransportFailure, detail)),
    )
}

fn malformed(diagnostic: String) -> (Decision, Option<DispatchError>) {
    let decision = Decision::error(format!(
        "My thought process was interrupted ({diagnostic}). Could you rephrase that?"
    ));
    (
        decision,
        Some(DispatchError::new(ErrorKind::MalformedResponse, diagnostic)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, prompt};
    use umbra_core::decision::{RESERVED_CONVERSATION, RESERVED_ERROR};

    fn resolver(provider: ScriptedProvider) -> IntentResolver {
        IntentResolver::new(Arc::new(provider), "test-model")
    }

    #[tokio::test]
    async fn tool_decision_passes_through() {
        let r = resolver(ScriptedProvider::replies(&[r#"{"tool":"weather","args":["Boston"]}"#]))
            .resolve(prompt("weather in Boston"))
            .await;
        assert_eq!(r.decision, Decision::new("weather", vec!["Boston".into()]));
        assert!(r.failure.is_none());
    }

    #[tokio::test]
    async fn plain_text_becomes_conversation() {
        let r = resolver(ScriptedProvider::replies(&["Hello there"]))
            .resolve(prompt("hi"))
            .await;
        assert_eq!(r.decision.tool, RESERVED_CONVERSATION);
        assert_eq!(r.decision.args, vec!["Hello there"]);
        assert!(r.failure.is_none());
    }

    #[tokio::test]
    async fn broken_json_is_malformed() {
        let r = resolver(ScriptedProvider::replies(&[r#"{"tool": "weather", "args": ["#]))
            .resolve(prompt("x"))
            .await;
        assert_eq!(r.decision.tool, RESERVED_ERROR);
        assert_eq!(r.failure.unwrap().kind, ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn provider_error_is_transport_failure() {
        let provider = ScriptedProvider::failing(ProviderError::Network("connection refused".into()));
        let r = resolver(provider).resolve(prompt("x")).await;
        assert_eq!(r.decision.tool, RESERVED_ERROR);
        assert!(r.decision.args[0].contains("connection refused"));
        assert_eq!(r.failure.unwrap().kind, ErrorKind::TransportFailure);
    }

    #[tokio::test]
    async fn unreadable_envelope_is_malformed_not_transport() {
        let provider = ScriptedProvider::failing(ProviderError::InvalidResponse(
            "generate envelope: expected value at line 1 column 1".into(),
        ));
        let r = resolver(provider).resolve(prompt("x")).await;
        assert_eq!(r.decision.tool, RESERVED_ERROR);
        assert!(r.decision.args[0].starts_with("My thought process was interrupted"));
        assert_eq!(r.failure.unwrap().kind, ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn garbage_from_a_live_ollama_endpoint_is_malformed() {
        let url = crate::test_helpers::respond_once("this is not json").await;
        let provider = umbra_providers::OllamaProvider::new(Some(url.as_str()));
        let r = IntentResolver::new(Arc::new(provider), "llama3")
            .resolve(prompt("weather in Boston"))
            .await;
        let failure = r.failure.unwrap();
        assert_eq!(failure.kind, ErrorKind::MalformedResponse);
        assert!(failure.detail.starts_with("ollama: "));
        assert!(!r.decision.args[0].contains("can't connect"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let provider = ScriptedProvider::replies(&["never seen"]).with_delay(Duration::from_secs(120));
        let r = resolver(provider)
            .with_timeout(Duration::from_secs(5))
            .resolve(prompt("x"))
            .await;
        let failure = r.failure.unwrap();
        assert_eq!(failure.kind, ErrorKind::TransportFailure);
        assert!(failure.detail.contains("within 5s"));
    }

    #[tokio::test]
    async fn request_carries_model_and_prompt() {
        let provider = Arc::new(ScriptedProvider::replies(&["ok"]));
        IntentResolver::new(provider.clone(), "llama3")
            .with_temperature(0.3)
            .resolve(prompt("weather in Boston"))
            .await;
        let seen = provider.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "llama3");
        assert_eq!(seen[0].temperature, 0.3);
        assert!(seen[0].user_text.ends_with("weather in Boston"));
    }
}
