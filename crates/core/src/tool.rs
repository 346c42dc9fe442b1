//! Tool trait — the abstraction over session capabilities.
//!
//! Tools are what let a run act beyond the engine: read the clock,
//! evaluate arithmetic, query the session database, look up knowledge.
//! The registry maps names to implementations and produces the spec list
//! sent to the engine each Thinking step.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::engine::ToolSpec;
use crate::error::ToolError;

/// The core Tool trait.
///
/// Each capability (current_time, calculator, db_query, retrieval, ...)
/// implements this trait. Tools are registered in the ToolRegistry and the
/// loop resolves them by the name the engine chose.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "calculator").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the engine).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Invoke the tool. The output string becomes the observation fed back
    /// into the conversation verbatim.
    async fn call(&self, arguments: serde_json::Value) -> std::result::Result<String, ToolError>;

    /// This tool's spec, as advertised to the engine.
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The loop uses this to:
/// 1. Get the specs to send to the engine
/// 2. Resolve and invoke tools when the engine requests them
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Resolve a tool by name, or report which name was unknown.
    pub fn resolve(&self, name: &str) -> std::result::Result<&dyn Tool, ToolError> {
        self.get(name)
            .ok_or_else(|| ToolError::Unknown(name.to_string()))
    }

    /// Specs for every registered tool.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|t| t.spec()).collect()
    }

    /// Specs for the named subset only. Names with no registered tool are
    /// skipped; the enabled set can only shrink what exists.
    pub fn specs_for(&self, enabled: &[String]) -> Vec<ToolSpec> {
        enabled
            .iter()
            .filter_map(|name| self.get(name).map(|t| t.spec()))
            .collect()
    }

    /// Resolve every named tool, in the order given. Unlike [`specs_for`],
    /// any absent name is an error; an empty selection is valid and yields
    /// an empty list.
    ///
    /// [`specs_for`]: ToolRegistry::specs_for
    pub fn enabled_subset(
        &self,
        enabled: &[String],
    ) -> std::result::Result<Vec<&dyn Tool>, ToolError> {
        enabled.iter().map(|name| self.resolve(name)).collect()
    }

    /// List all registered tool names, sorted for stable output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
