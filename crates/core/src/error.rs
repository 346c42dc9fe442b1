//! Error types for the toolrun domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! The taxonomy mirrors the runtime's propagation policy:
//! - [`ToolError`] — recoverable; the loop folds it into an observation.
//! - [`EngineError`] — fatal to the current run, the session stays usable.
//! - [`ProvisionError`] — fatal to session activation, surfaced immediately.
//! - [`CleanupError`] — logged only, never surfaced to callers.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all toolrun operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Engine errors ---
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Resource provisioning ---
    #[error("Provision error: {0}")]
    Provision(#[from] ProvisionError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures raised by the reasoning engine.
///
/// Unlike tool failures these are never absorbed into the transcript —
/// the loop surfaces them as a run-level failure.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by endpoint, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed engine response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Engine not configured: {0}")]
    NotConfigured(String),
}

/// Failures local to a single tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    Unknown(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Failures while provisioning an ephemeral session resource.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Template resource unreadable at {path}: {reason}")]
    TemplateUnreadable { path: PathBuf, reason: String },

    #[error("Destination could not be created at {path}: {reason}")]
    DestinationUnavailable { path: PathBuf, reason: String },
}

/// A failed deletion of an ephemeral resource.
///
/// Deliberately a plain message: cleanup failures are logged by whoever
/// observes them and never propagated further.
#[derive(Debug, Clone, Error)]
#[error("Cleanup failed: {0}")]
pub struct CleanupError(pub String);
