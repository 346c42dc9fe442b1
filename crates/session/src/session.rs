//! Session lifecycle — retention-scheduled disposal of per-session state.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use toolrun_core::{ProvisionError, SessionId, Transcript, Turn};
use toolrun_scheduler::JobScheduler;

use crate::resource::{ResourceHandle, ResourceManager};

/// The default idle retention before a released session's resources are
/// deleted.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30 * 60);

/// One live conversation with its transcript and provisioned resources.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub transcript: Transcript,
    pub resource: ResourceHandle,
}

impl Session {
    pub fn record(&mut self, turn: Turn) {
        self.transcript.push(turn);
    }
}

/// Ties resource provisioning to the scheduler's retention window.
///
/// Every activation (re)provisions the session's resources and schedules
/// their disposal for one retention period later, cancelling whatever
/// disposal was already queued. The working copy therefore always has
/// exactly one pending deletion, dated from the last activation. Releasing
/// a session restarts that clock; disposing is immediate.
pub struct SessionResourceManager {
    resources: ResourceManager,
    scheduler: Arc<JobScheduler>,
    retention: Duration,
}

impl SessionResourceManager {
    pub fn new(resources: ResourceManager, scheduler: Arc<JobScheduler>) -> Self {
        Self {
            resources,
            scheduler,
            retention: DEFAULT_RETENTION,
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// The scheduler tag under which a session's disposal jobs are filed.
    fn tag_for(&self, session_id: &SessionId) -> String {
        self.resources.session_dir(session_id).display().to_string()
    }

    /// Bring a session up: rescue it from any pending disposal, make sure
    /// its resources exist, and schedule a fresh disposal one retention
    /// period out.
    pub async fn activate(&self, session_id: &SessionId) -> Result<Session, ProvisionError> {
        let rescued = self.scheduler.cancel_tag(&self.tag_for(session_id)).await;
        if rescued > 0 {
            info!(session_id = %session_id, cancelled = rescued, "Session resumed, disposal cancelled");
        }

        let resource = self.resources.provision(session_id).await?;
        self.schedule_disposal(session_id, &resource).await;
        Ok(Session {
            id: session_id.clone(),
            transcript: Transcript::new(),
            resource,
        })
    }

    /// Release a session: restart its retention clock so the resources stay
    /// on disk for one full retention period from now. Returns the job id.
    pub async fn release(&self, session: &Session) -> String {
        self.scheduler.cancel_tag(&self.tag_for(&session.id)).await;
        info!(session_id = %session.id, retention_secs = self.retention.as_secs(), "Session released");
        self.schedule_disposal(&session.id, &session.resource).await
    }

    /// Tear a session's resources down immediately, cancelling the pending
    /// disposal. Deletion failures are logged, never surfaced.
    pub async fn dispose_now(&self, session: &Session) {
        self.scheduler.cancel_tag(&self.tag_for(&session.id)).await;
        if let Err(e) = ResourceManager::dispose_now(&session.resource.dir).await {
            warn!(session_id = %session.id, error = %e, "Session disposal failed");
        } else {
            info!(session_id = %session.id, "Session disposed");
        }
    }

    /// Queue deletion of the session directory after the retention period.
    /// Callers cancel the tag first, so at most one job is ever pending.
    async fn schedule_disposal(&self, session_id: &SessionId, resource: &ResourceHandle) -> String {
        let dir = resource.dir.clone();
        self.scheduler
            .schedule(
                self.tag_for(session_id),
                self.retention,
                Box::new(move || Box::pin(async move { ResourceManager::dispose_now(&dir).await })),
            )
            .await
    }
}
