//! Turn and Transcript domain types.
//!
//! A session's conversation history is an append-only sequence of turns:
//! one user query paired with the loop's final answer for that query.
//! Intermediate tool invocations belong to the run trace, not the
//! transcript — they are discarded (or folded into the displayed trace)
//! once the run ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One completed exchange: a user query and the run's final answer.
///
/// Immutable once appended to a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// The user's query.
    pub query: String,

    /// The final answer produced by the loop (possibly the incomplete-answer
    /// marker if the iteration budget ran out).
    pub answer: String,

    /// When the run finished.
    pub completed_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(query: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            answer: answer.into(),
            completed_at: Utc::now(),
        }
    }
}

/// An append-only, chronologically ordered sequence of turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Create a new empty transcript.
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Append a completed turn. There is no removal operation.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The turns in chronological order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
