//! The toolrun execution loop.
//!
//! Three pieces: [`ToolLoop`] runs the bounded decide/act/observe cycle,
//! [`OutputRelay`] folds its step events into a displayable trace, and
//! [`ScriptedEngine`] stands in for a real engine in tests and offline
//! runs.

pub mod loop_runner;
pub mod relay;
pub mod scripted;

pub use loop_runner::{
    DEFAULT_MAX_ITERATIONS, ITERATION_CEILING, ITERATION_LIMIT_ANSWER, RunOutcome, ToolInvocation,
    ToolLoop,
};
pub use relay::OutputRelay;
pub use scripted::ScriptedEngine;
