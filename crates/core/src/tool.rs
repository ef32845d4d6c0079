//! Tool trait and registry: the callable capabilities behind each decision.
//!
//! A tool declares its positional arity as data. The dispatcher checks that
//! arity explicitly before invoking, so a wrong argument count becomes a
//! structured error instead of a runtime fault inside the tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use crate::decision::is_reserved;
use crate::error::{RegistryError, ToolError};

/// How many positional arguments a tool takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    /// Exactly this many arguments.
    Exact(usize),
    /// Any number of arguments; strict checking is skipped.
    Variadic,
}

impl Arity {
    /// Whether `count` arguments satisfy this arity.
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Self::Exact(n) => *n == count,
            Self::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(0) => write!(f, "no arguments"),
            Self::Exact(1) => write!(f, "1 argument"),
            Self::Exact(n) => write!(f, "{n} arguments"),
            Self::Variadic => write!(f, "any arguments"),
        }
    }
}

/// The core Tool trait.
///
/// Each capability (weather, recall, distance, ...) implements this trait and
/// is registered in the [`ToolRegistry`] for a session.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "weather", "add-friend").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the language model).
    fn description(&self) -> &str;

    /// Declared positional arity.
    fn arity(&self) -> Arity;

    /// Run the tool. `Ok(None)` means it succeeded with nothing to show.
    async fn execute(&self, args: Vec<String>) -> Result<Option<String>, ToolError>;
}

type ToolFn = dyn Fn(Vec<String>) -> Result<Option<String>, ToolError> + Send + Sync;

/// A tool backed by a plain synchronous closure.
pub struct FnTool {
    name: String,
    description: String,
    arity: Arity,
    func: Box<ToolFn>,
}

impl FnTool {
    pub fn new<F>(
        name: impl Into<String>,
        arity: Arity,
        description: impl Into<String>,
        func: F,
    ) -> Self
    where
        F: Fn(Vec<String>) -> Result<Option<String>, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            arity,
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    async fn execute(&self, args: Vec<String>) -> Result<Option<String>, ToolError> {
        (self.func)(args)
    }
}

/// A registered capability: name, arity, operation and description.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub arity: Arity,
    pub description: String,
    operation: Arc<dyn Tool>,
}

impl ToolDescriptor {
    /// Describe a tool, copying its name, arity and description.
    pub fn from_tool(tool: Arc<dyn Tool>) -> Self {
        Self {
            name: tool.name().to_string(),
            arity: tool.arity(),
            description: tool.description().to_string(),
            operation: tool,
        }
    }

    /// Invoke the underlying operation. Callers check arity first.
    pub async fn invoke(&self, args: Vec<String>) -> Result<Option<String>, ToolError> {
        self.operation.execute(args).await
    }

    /// One manifest line for the language model.
    pub fn manifest_line(&self) -> String {
        format!("- {} ({}): {}", self.name, self.arity, self.description)
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("description", &self.description)
            .finish()
    }
}

/// A registry of available tools, keyed by name.
///
/// Built once per session through [`ToolRegistryBuilder`] and shared behind an
/// `Arc`; a registry in use cannot gain tools. Rebuilding means registering
/// into a fresh builder and reloading the context assembler.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Get a tool by name.
    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// All descriptors in name order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    /// List all registered tool names (sorted).
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Collects descriptors, rejecting duplicates and reserved names.
#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolRegistryBuilder {
    /// Register a descriptor. Fails on duplicates and reserved names.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<&mut Self, RegistryError> {
        if is_reserved(&descriptor.name) {
            return Err(RegistryError::ReservedName(descriptor.name));
        }
        if self.tools.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateTool(descriptor.name));
        }
        self.tools.insert(descriptor.name.clone(), descriptor);
        Ok(self)
    }

    /// Register a tool implementation.
    pub fn register_tool(&mut self, tool: impl Tool + 'static) -> Result<&mut Self, RegistryError> {
        self.register(ToolDescriptor::from_tool(Arc::new(tool)))
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry { tools: self.tools }
    }
}
