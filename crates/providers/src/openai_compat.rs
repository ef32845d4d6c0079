//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Groq, vLLM, llama.cpp server, and any
//! endpoint exposing `/chat/completions`.
//!
//! The system context goes in a `system` message and the user text in a
//! single `user` message. JSON output is requested via
//! `response_format: {"type": "json_object"}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use umbra_core::error::ProviderError;
use umbra_core::provider::{Provider, ProviderRequest, ProviderResponse};
use crate::status::{DEFAULT_HTTP_TIMEOUT_SECS, build_client, check_status, send_error};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: build_client(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// Override the client timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.client = build_client(secs);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_body(request: &ProviderRequest) -> serde_json::Value {
        let messages = vec![
            ApiMessage {
                role: "system".into(),
                content: request.system_context.clone(),
            },
            ApiMessage {
                role: "user".into(),
                content: request.user_text.clone(),
            },
        ];

        serde_json::json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
            "stream": false,
            "response_format": { "type": "json_object" },
        })
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;

        let response = check_status(response).await?;

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("completion envelope: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("no choices in response".into()))?;

        Ok(ProviderResponse {
            content: choice.message.content.unwrap_or_default(),
            model: api_response.model.unwrap_or(request.model),
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(send_error)?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "gpt-4o-mini".into(),
            system_context: "--- AVAILABLE TOOLS ---".into(),
            user_text: "how far is Boston from New York".into(),
            temperature: 0.0,
        }
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let p = OpenAiCompatProvider::new("openrouter", "https://openrouter.ai/api/v1", "sk-test");
        assert_eq!(p.name(), "openrouter");
        assert_eq!(p.base_url(), "https://openrouter.ai/api/v1");

        let p = OpenAiCompatProvider::new("vllm", "http://localhost:8000/v1/", "");
        assert_eq!(p.base_url(), "http://localhost:8000/v1");
    }

    #[test]
    fn body_has_system_then_user() {
        let body = OpenAiCompatProvider::build_body(&request());
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "how far is Boston from New York");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn parse_chat_response() {
        let data = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "{\"tool\":\"distance\",\"args\":[\"Boston\",\"New York\"]}"}, "finish_reason": "stop"}]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.model.as_deref(), Some("gpt-4o-mini"));
        let content = parsed.choices[0].message.content.as_deref().unwrap();
        assert!(content.contains("distance"));
    }

    #[test]
    fn parse_null_content() {
        let data = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn unreadable_body_is_invalid_response() {
        let url = crate::test_server::respond_once("<html>gateway</html>").await;
        let provider = OpenAiCompatProvider::new("local", &format!("{url}/v1"), "");
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn empty_choices_is_invalid_response() {
        let url = crate::test_server::respond_once(r#"{"choices":[]}"#).await;
        let provider = OpenAiCompatProvider::new("local", &format!("{url}/v1"), "");
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let provider = OpenAiCompatProvider::new("local", "http://127.0.0.1:1/v1", "").with_timeout(5);
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_) | ProviderError::Timeout(_)));
    }
}
