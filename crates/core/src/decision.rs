//! The structured decision produced by the language model for each turn.
//!
//! Wire shape: `{"tool": <string>, "args": [<string>, ...]}`, with an
//! optional free-text `"thought"`. The nested form
//! `{"thought": .., "decision": {"tool": .., "args": [..]}}` is accepted too.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved tool name: render the arguments as a conversational reply.
pub const RESERVED_CONVERSATION: &str = "conversation";

/// Reserved tool name: render the first argument as a diagnostic.
pub const RESERVED_ERROR: &str = "error";

/// Which tool to run and with what positional arguments.
///
/// Produced once per user turn and consumed exactly once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Tool name (registry key or one of the reserved names)
    pub tool: String,

    /// Ordered positional arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Free-text rationale; never executed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
}

impl Decision {
    pub fn new(tool: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            tool: tool.into(),
            args,
            thought: None,
        }
    }

    /// Attach a rationale.
    pub fn with_thought(mut self, thought: impl Into<String>) -> Self {
        self.thought = Some(thought.into());
        self
    }

    /// A conversational reply carrying `text` verbatim.
    pub fn conversation(text: impl Into<String>) -> Self {
        Self::new(RESERVED_CONVERSATION, vec![text.into()])
    }

    /// A diagnostic decision; dispatching it never touches the registry.
    pub fn error(diagnostic: impl Into<String>) -> Self {
        Self::new(RESERVED_ERROR, vec![diagnostic.into()])
    }

    /// Whether the tool name bypasses the registry.
    pub fn is_reserved(&self) -> bool {
        is_reserved(&self.tool)
    }

    /// Serialize to the wire shape.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Classify a raw language-model response. See [`Interpretation`].
    pub fn interpret(raw: &str) -> Interpretation {
        interpret(raw)
    }
}

/// Whether `name` is one of the reserved tool names.
pub fn is_reserved(name: &str) -> bool {
    name == RESERVED_CONVERSATION || name == RESERVED_ERROR
}

/// How a raw response body was understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    /// A well-formed tool invocation.
    Tool(Decision),

    /// Free text, or a JSON object without a `tool` key.
    Conversation(String),

    /// Looked like a structured decision but could not be parsed.
    Malformed(String),
}

impl Interpretation {
    /// Collapse into a dispatchable decision (malformed becomes `error`).
    pub fn into_decision(self) -> Decision {
        match self {
            Self::Tool(decision) => decision,
            Self::Conversation(text) => Decision::conversation(text),
            Self::Malformed(diagnostic) => Decision::error(diagnostic),
        }
    }
}

/// Classify a raw response.
///
/// Rules, in order:
/// 1. Markdown code fences around the body are stripped.
/// 2. Empty body is malformed.
/// 3. Anything not starting with `{` or `[` is conversation.
/// 4. Unparseable JSON is malformed.
/// 5. Non-object JSON, or an object without `tool`, is conversation.
/// 6. `tool` must be a string and `args` a list of scalars, else malformed.
pub fn interpret(raw: &str) -> Interpretation {
    let body = strip_code_fence(raw.trim());

    if body.is_empty() {
        return Interpretation::Malformed("the language model returned an empty response".into());
    }

    if !body.starts_with('{') && !body.starts_with('[') {
        return Interpretation::Conversation(body.to_string());
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            return Interpretation::Malformed(format!("response is not valid JSON: {e}"));
        }
    };

    let Value::Object(outer) = &value else {
        return Interpretation::Conversation(body.to_string());
    };

    let outer_thought = outer.get("thought").and_then(Value::as_str);

    // Nested form: {"thought": .., "decision": {..}}
    let inner = match outer.get("decision") {
        Some(Value::Object(inner)) if !outer.contains_key("tool") => inner,
        _ => outer,
    };

    let Some(tool) = inner.get("tool") else {
        return Interpretation::Conversation(body.to_string());
    };

    let Some(tool) = tool.as_str() else {
        return Interpretation::Malformed(format!("'tool' must be a string, got {tool}"));
    };

    let tool = tool.trim();
    if tool.is_empty() {
        return Interpretation::Malformed("'tool' is empty".into());
    }

    let args = match inner.get("args") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut args = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => args.push(s.clone()),
                    Value::Number(n) => args.push(n.to_string()),
                    Value::Bool(b) => args.push(b.to_string()),
                    other => {
                        return Interpretation::Malformed(format!(
                            "argument {other} is not a scalar value"
                        ));
                    }
                }
            }
            args
        }
        Some(other) => {
            return Interpretation::Malformed(format!("'args' must be a list, got {other}"));
        }
    };

    let thought = inner
        .get("thought")
        .and_then(Value::as_str)
        .or(outer_thought)
        .map(str::to_string);

    Interpretation::Tool(Decision {
        tool: tool.to_string(),
        args,
        thought,
    })
}

/// Strip a surrounding ```` ```json ... ``` ```` fence if present.
fn strip_code_fence(body: &str) -> &str {
    let Some(rest) = body.strip_prefix("```") else {
        return body;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return body;
    };
    // Drop an optional language tag on the opening line.
    let rest = match rest.find('\n') {
        Some(idx) if !rest[..idx].trim().contains(' ') => &rest[idx + 1..],
        _ => rest,
    };
    rest.trim()
}
