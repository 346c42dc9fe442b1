//! Engine trait — the abstraction over the reasoning backend.
//!
//! An Engine is handed the conversation so far plus the specifications of
//! the tools the session has enabled, and decides the next move: call a
//! tool with some arguments, or produce the final answer. The loop never
//! cares how that decision is made — an HTTP-backed LLM endpoint and a
//! scripted test double are interchangeable here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// The role of a message shown to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineRole {
    /// System instructions (identity, rules)
    System,
    /// The end user
    User,
    /// The engine's own prior output
    Assistant,
    /// A tool observation fed back into the conversation
    Tool,
}

/// A single message in the context handed to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineMessage {
    pub role: EngineRole,
    pub content: String,
}

impl EngineMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: EngineRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: EngineRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: EngineRole::Assistant,
            content: content.into(),
        }
    }

    pub fn observation(content: impl Into<String>) -> Self {
        Self {
            role: EngineRole::Tool,
            content: content.into(),
        }
    }
}

/// A tool specification sent to the engine so it knows what it may call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// The engine's decision for one Thinking step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineDecision {
    /// Invoke a tool and feed the observation back.
    ToolCall {
        tool: String,
        arguments: serde_json::Value,
        /// Optional narration accompanying the call (shown in the trace).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thought: Option<String>,
    },

    /// The run is done; this text is the answer.
    Final { text: String },
}

/// The core Engine trait.
///
/// Every reasoning backend implements this. The loop calls `decide()`
/// without knowing which backend is in use — pure polymorphism.
#[async_trait]
pub trait Engine: Send + Sync {
    /// A human-readable name for this engine (e.g., "openai-compat").
    fn name(&self) -> &str;

    /// Given the conversation so far and the enabled tool specs, decide the
    /// next move. This is the only externally-bound blocking point of a run.
    async fn decide(
        &self,
        messages: &[EngineMessage],
        tools: &[ToolSpec],
    ) -> std::result::Result<EngineDecision, EngineError>;
}
