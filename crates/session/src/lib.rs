//! Session lifecycle and ephemeral resource management.
//!
//! A session owns a transcript and a private working copy of the template
//! database. Resources outlive the session by a retention window: released
//! sessions keep their state on disk until a scheduled disposal job fires,
//! and resuming a session inside that window rescues it intact.

pub mod resource;
pub mod session;

pub use resource::{ResourceHandle, ResourceManager};
pub use session::{DEFAULT_RETENTION, Session, SessionResourceManager};
