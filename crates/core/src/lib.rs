//! # toolrun Core
//!
//! Domain types, traits, and error definitions for the toolrun assistant
//! runtime. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod engine;
pub mod error;
pub mod step;
pub mod tool;
pub mod transcript;

// Re-export key types at crate root for ergonomics
pub use engine::{Engine, EngineDecision, EngineMessage, EngineRole, ToolSpec};
pub use error::{CleanupError, EngineError, Error, ProvisionError, Result, ToolError};
pub use step::StepEvent;
pub use tool::{Tool, ToolRegistry};
pub use transcript::{SessionId, Transcript, Turn};
