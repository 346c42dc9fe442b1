//! Engine backends.
//!
//! One implementation covers nearly every hosted and local model today:
//! the OpenAI-compatible chat-completions API. Everything else in the
//! runtime talks to [`toolrun_core::Engine`] and never sees HTTP.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatEngine;
