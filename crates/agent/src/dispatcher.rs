//! Decision validation and dispatch.
//!
//! A decision moves `RECEIVED → VALIDATED → EXECUTED` or
//! `RECEIVED → REJECTED`. Every outcome, failures included, comes back as a
//! `DispatchResult` carrying text the user can read.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};
use umbra_core::decision::{Decision, RESERVED_CONVERSATION, RESERVED_ERROR};
use umbra_core::error::{DispatchError, ErrorKind};
use umbra_core::event::{DomainEvent, EventBus};
use umbra_core::tool::{Arity, ToolRegistry};

/// Shown when the model chose to talk but said nothing.
pub const EMPTY_REPLY: &str = "I'm not sure how to respond to that.";

/// The outcome of one dispatched decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<DispatchError>,
}

impl DispatchResult {
    fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            rendered_output: Some(output.into()),
            error: None,
        }
    }

    fn failed(message: impl Into<String>, error: DispatchError) -> Self {
        Self {
            success: false,
            rendered_output: Some(message.into()),
            error: Some(error),
        }
    }

    /// The text to show the user.
    pub fn reply(&self) -> &str {
        match &self.rendered_output {
            Some(text) if !text.trim().is_empty() => text,
            _ => EMPTY_REPLY,
        }
    }
}

pub struct Dispatcher {
    events: EventBus,
}

impl Dispatcher {
    pub fn new(events: EventBus) -> Self {
        Self { events }
    }

    /// Validate `decision` against `registry` and run it.
    ///
    /// `failure` is what the resolver attached to a reserved `error`
    /// decision; it decides the reported kind.
    pub async fn dispatch(
        &self,
        registry: &ToolRegistry,
        decision: &Decision,
        failure: Option<DispatchError>,
    ) -> DispatchResult {
        match decision.tool.as_str() {
            RESERVED_CONVERSATION => return DispatchResult::ok(decision.args.join(" ")),
            RESERVED_ERROR => return render_error(decision, failure),
            _ => {}
        }

        let Some(descriptor) = registry.lookup(&decision.tool) else {
            let detail = format!("no tool named '{}'", decision.tool);
            self.reject(decision, &detail);
            return DispatchResult::failed(
                format!(
                    "I decided on a tool named '{}' that doesn't exist yet. My mistake.",
                    decision.tool
                ),
                DispatchError::new(ErrorKind::UnknownTool, detail),
            );
        };

        let received = decision.args.len();
        if let Arity::Exact(expected) = descriptor.arity
            && expected != received
        {
            let detail = format!("expected {expected}, got {received}");
            self.reject(decision, &detail);
            return DispatchResult::failed(
                arity_message(&decision.tool, expected, received),
                DispatchError::new(ErrorKind::ArityMismatch { expected, received }, detail),
            );
        }

        debug!(tool = %decision.tool, args = ?decision.args, "Executing tool");
        let started = Instant::now();
        let outcome = descriptor.invoke(decision.args.clone()).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        self.events.publish(DomainEvent::ToolExecuted {
            tool_name: decision.tool.clone(),
            success: outcome.is_ok(),
            duration_ms,
            timestamp: Utc::now(),
        });

        match outcome {
            Ok(Some(output)) if !output.trim().is_empty() => {
                info!(tool = %decision.tool, duration_ms, "Tool succeeded");
                DispatchResult::ok(output)
            }
            Ok(_) => {
                info!(tool = %decision.tool, duration_ms, "Tool succeeded with no output");
                DispatchResult::ok(format!("Successfully executed: {}", decision.tool))
            }
            Err(e) => {
                warn!(tool = %decision.tool, error = %e, "Tool failed");
                DispatchResult::failed(
                    format!("An error occurred while executing '{}': {e}", decision.tool),
                    DispatchError::new(ErrorKind::ToolExecutionFailed, e.to_string()),
                )
            }
        }
    }

    fn reject(&self, decision: &Decision, reason: &str) {
        warn!(tool = %decision.tool, reason, "Decision rejected");
        self.events.publish(DomainEvent::DecisionRejected {
            tool: decision.tool.clone(),
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });
    }
}

fn pieces(n: usize) -> String {
    if n == 1 {
        "1 piece".into()
    } else {
        format!("{n} pieces")
    }
}

/// Ask for a rephrase, worded for too few or too many arguments.
fn arity_message(tool: &str, expected: usize, received: usize) -> String {
    if received < expected {
        format!(
            "I tried to use my '{tool}' tool, but I didn't have all the information I needed. \
             That tool requires {} of information, but I only found {received}. \
             Could you please rephrase your request with all the necessary details?",
            pieces(expected)
        )
    } else {
        format!(
            "I tried to use my '{tool}' tool, but I picked out more information than it takes. \
             That tool takes only {} of information, but I found {received}. \
             Could you please rephrase your request more precisely?",
            pieces(expected)
        )
    }
}

/// A reserved `error` decision. Without a resolver failure the model chose
/// `error` itself, which counts as a malformed answer.
fn render_error(decision: &Decision, failure: Option<DispatchError>) -> DispatchResult {
    let diagnostic = decision
        .args
        .first()
        .map(String::as_str)
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("Something went wrong while working out what to do.");
    let error = failure
        .unwrap_or_else(|| DispatchError::new(ErrorKind::MalformedResponse, diagnostic));
    DispatchResult::failed(diagnostic, error)
}
