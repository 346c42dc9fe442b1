//! Structured events emitted during a tool-execution run.
//!
//! The loop publishes one event per meaningful step instead of writing
//! prose to stdout. Frontends subscribe to the stream and render however
//! they like (the CLI folds events into a growing trace; a server could
//! forward them over SSE). Serialized with a `type` tag for wire use.

use serde::{Deserialize, Serialize};

/// One observable step of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepEvent {
    /// The engine's reasoning text before a tool call, when it offers any.
    Thought { iteration: usize, text: String },

    /// The engine chose a tool and the loop is about to invoke it.
    Action {
        iteration: usize,
        tool: String,
        arguments: serde_json::Value,
    },

    /// The result of a tool invocation, successful or not. Failed calls
    /// carry their error text here — they never abort the run.
    Observation {
        iteration: usize,
        tool: String,
        text: String,
        success: bool,
    },

    /// The run finished. `complete` is false when the iteration budget ran
    /// out and the text is the incomplete-answer marker.
    Answer { text: String, complete: bool },
}

impl StepEvent {
    /// The event kind as a static string, for logging and filtering.
    pub fn kind(&self) -> &'static str {
        match self {
            StepEvent::Thought { .. } => "thought",
            StepEvent::Action { .. } => "action",
            StepEvent::Observation { .. } => "observation",
            StepEvent::Answer { .. } => "answer",
        }
    }

    /// The iteration this event belongs to, if any. Answers are terminal
    /// and not tied to a single iteration.
    pub fn iteration(&self) -> Option<usize> {
        match self {
            StepEvent::Thought { iteration, .. }
            | StepEvent::Action { iteration, .. }
            | StepEvent::Observation { iteration, .. } => Some(*iteration),
            StepEvent::Answer { .. } => None,
        }
    }
}
