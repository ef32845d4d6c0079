//! Ollama provider using the native `/api/generate` endpoint.
//!
//! The request asks for JSON output (`"format": "json"`) with streaming off,
//! and the model's text comes back in the `response` field.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use umbra_core::error::ProviderError;
use umbra_core::provider::{Provider, ProviderRequest, ProviderResponse};
use crate::status::{DEFAULT_HTTP_TIMEOUT_SECS, build_client, check_status, send_error};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_OLLAMA_URL)
                .trim_end_matches('/')
                .to_string(),
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

    fn build_body(request: &ProviderRequest) -> GenerateRequest<'_> {
        GenerateRequest {
            model: &request.model,
            system: &request.system_context,
            prompt: &request.user_text,
            format: "json",
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
            },
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        debug!(model = %request.model, url = %url, "Sending generate request");

        let response = self
            .client
            .post(&url)
            .json(&Self::build_body(&request))
            .send()
            .await
            .map_err(send_error)?;

        let response = check_status(response).await?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("generate envelope: {e}")))?;

        Ok(ProviderResponse {
            content: body.response,
            model: body.model.unwrap_or(request.model),
        })
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await.map_err(send_error)?;
        Ok(response.status().is_success())
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    format: &'static str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    model: Option<String>,
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "llama3".into(),
            system_context: "You are Umbra.".into(),
            user_text: "weather in Boston".into(),
            temperature: 0.0,
        }
    }

    #[test]
    fn default_base_url() {
        assert_eq!(OllamaProvider::new(None).base_url(), "http://localhost:11434");
        assert_eq!(
            OllamaProvider::new(Some("http://gpu-box:11434/")).base_url(),
            "http://gpu-box:11434"
        );
    }

    #[test]
    fn body_requests_json_without_streaming() {
        let req = request();
        let body = serde_json::to_value(OllamaProvider::build_body(&req)).unwrap();
        assert_eq!(body["model"], "llama3");
        assert_eq!(body["system"], "You are Umbra.");
        assert_eq!(body["prompt"], "weather in Boston");
        assert_eq!(body["format"], "json");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0.0);
    }

    #[test]
    fn parse_generate_response() {
        let data = r#"{"model":"llama3","created_at":"2024-05-01T00:00:00Z","response":"{\"tool\":\"weather\",\"args\":[\"Boston\"]}","done":true}"#;
        let parsed: GenerateResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.model.as_deref(), Some("llama3"));
        assert!(parsed.response.contains("\"weather\""));
    }

    #[tokio::test]
    async fn unreadable_body_is_invalid_response() {
        let url = crate::test_server::respond_once("this is not json").await;
        let err = OllamaProvider::new(Some(url.as_str())).complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn envelope_without_response_field_is_invalid() {
        let url = crate::test_server::respond_once(r#"{"model":"llama3","done":true}"#).await;
        let err = OllamaProvider::new(Some(url.as_str())).complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn generate_reply_is_returned_verbatim() {
        let url = crate::test_server::respond_once(
            r#"{"model":"llama3","response":"{\"tool\":\"weather\",\"args\":[\"Boston\"]}","done":true}"#,
        )
        .await;
        let reply = OllamaProvider::new(Some(url.as_str())).complete(request()).await.unwrap();
        assert_eq!(reply.content, r#"{"tool":"weather","args":["Boston"]}"#);
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let provider = OllamaProvider::new(Some("http://127.0.0.1:1")).with_timeout(5);
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_) | ProviderError::Timeout(_)));
    }
}
