//! Shared test doubles: a scripted intent service, a counting tool and a
//! one-shot HTTP responder.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use umbra_core::error::{ProviderError, ToolError};
use umbra_core::provider::{Provider, ProviderRequest, ProviderResponse};
use umbra_core::tool::{Arity, Tool};
use crate::context::AssembledPrompt;

/// Returns scripted replies in order, repeating the last one once the
/// script runs out. Every request is kept for inspection.
pub struct ScriptedProvider {
    replies: Vec<Result<String, ProviderError>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn replies(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| Ok(r.to_string())).collect(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            replies: vec![Err(error)],
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let index = {
            let mut seen = self.requests.lock().unwrap();
            seen.push(request);
            seen.len() - 1
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self
            .replies
            .get(index)
            .or_else(|| self.replies.last())
            .cloned()
            .unwrap_or_else(|| Ok(String::new()))?;
        Ok(ProviderResponse {
            content: reply,
            model: "scripted-model".into(),
        })
    }
}

/// A tool that records every argument list it receives.
pub struct CountingTool {
    name: String,
    arity: Arity,
    reply: Option<String>,
    fail_with: Option<String>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl CountingTool {
    pub fn new(name: &str, arity: Arity) -> Self {
        Self {
            name: name.into(),
            arity,
            reply: None,
            fail_with: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn replying(mut self, reply: &str) -> Self {
        self.reply = Some(reply.into());
        self
    }

    pub fn failing(mut self, reason: &str) -> Self {
        self.fail_with = Some(reason.into());
        self
    }

    /// Handle to the recorded calls; stays valid after the tool is registered.
    pub fn calls(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl Tool for CountingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Counts its calls"
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    async fn execute(&self, args: Vec<String>) -> Result<Option<String>, ToolError> {
        self.calls.lock().unwrap().push(args);
        match &self.fail_with {
            Some(reason) => Err(ToolError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason: reason.clone(),
            }),
            None => Ok(self.reply.clone()),
        }
    }
}

pub fn prompt(utterance: &str) -> AssembledPrompt {
    AssembledPrompt {
        system_context: "You are a test assistant.".into(),
        user_text: format!("--- Current Prompt ---\n{utterance}"),
    }
}

/// Answer one HTTP request with `200 OK` and `body`. Returns the base URL.
pub async fn respond_once(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut seen = Vec::new();
        let mut chunk = [0u8; 4096];
        // Headers, then as many body bytes as content-length announces.
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            seen.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&seen);
            let Some(end) = text.find("\r\n\r\n") else {
                continue;
            };
            let body_len = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if seen.len() >= end + 4 + body_len {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });
    format!("http://{addr}")
}
