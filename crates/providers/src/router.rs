//! Provider selection: turns the configured name into one intent service.

use std::sync::Arc;
use umbra_config::AppConfig;
use umbra_core::error::ProviderError;
use umbra_core::provider::Provider;
use crate::ollama::OllamaProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Endpoints for the OpenAI-compatible services Umbra knows by name.
fn known_base_url(provider_name: &str) -> Option<&'static str> {
    Some(match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1",
        "openai" => "https://api.openai.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    })
}

/// Build the provider named in the configuration.
///
/// `ollama` uses the native generate endpoint; every other name goes through
/// the OpenAI-compatible client. Unknown names need an explicit `api_url`.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    // Leave headroom so the resolver's own bound fires first.
    let http_timeout = config.resolver.timeout_secs.saturating_add(5);

    if config.provider == "ollama" {
        return Ok(Arc::new(
            OllamaProvider::new(config.api_url.as_deref()).with_timeout(http_timeout),
        ));
    }

    let base_url = match (&config.api_url, known_base_url(&config.provider)) {
        (Some(url), _) => url.clone(),
        (None, Some(url)) => url.to_string(),
        (None, None) => {
            return Err(ProviderError::NotConfigured(format!(
                "unknown provider '{}'; set api_url to its OpenAI-compatible endpoint",
                config.provider
            )));
        }
    };
    let api_key = config.api_key.clone().unwrap_or_default();

    Ok(Arc::new(
        OpenAiCompatProvider::new(&config.provider, &base_url, &api_key).with_timeout(http_timeout),
    ))
}
