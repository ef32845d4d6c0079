//! Shared HTTP plumbing for the tools that call external APIs.

use tracing::warn;
use umbra_core::error::ToolError;

/// Per-request timeout for tool API calls.
pub const TOOL_HTTP_TIMEOUT_SECS: u64 = 30;

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(TOOL_HTTP_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

pub(crate) fn request_failed(tool: &str, e: reqwest::Error) -> ToolError {
    let reason = if e.is_timeout() {
        format!("the request timed out ({e})")
    } else {
        format!("could not reach the service ({e})")
    };
    ToolError::ExecutionFailed {
        tool_name: tool.into(),
        reason,
    }
}

pub(crate) fn bad_payload(tool: &str, e: impl std::fmt::Display) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: tool.into(),
        reason: format!("unexpected response ({e})"),
    }
}

/// Pass 2xx responses through; otherwise surface the API's own message.
pub(crate) async fn check_status(
    tool: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ToolError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(tool, status = status.as_u16(), body = %body, "Tool API returned error");
    Err(ToolError::ExecutionFailed {
        tool_name: tool.into(),
        reason: format!("HTTP {}: {}", status.as_u16(), api_message(&body)),
    })
}

/// Pull `message` or `error.message` out of a JSON error body.
fn api_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };
    value["error"]["message"]
        .as_str()
        .or_else(|| value["message"].as_str())
        .or_else(|| value["detail"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

/// The configured key, or a `NotConfigured` error naming what is missing.
pub(crate) fn require_key<'a>(key: &'a Option<String>, what: &str) -> Result<&'a str, ToolError> {
    match key.as_deref() {
        Some(k) if !k.trim().is_empty() => Ok(k),
        _ => Err(ToolError::NotConfigured(format!("{what} API key is not set"))),
    }
}
