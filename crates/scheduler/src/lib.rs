//! Job scheduler — delayed one-shot background jobs.
//!
//! Manages deferred actions (typically ephemeral-resource cleanup) that
//! fire once after a delay. Jobs carry a tag identifying their owner:
//! scheduling replaces any pending job with the same tag, and a tag's
//! jobs can be cancelled together. The scheduler is an explicit instance: callers
//! construct one, share it via `Arc`, and start its tick loop themselves.
//! Nothing here is process-global.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use toolrun_core::CleanupError;

/// The default interval between due-job sweeps.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// How many executed or cancelled job records are kept for status queries.
/// The scheduler lives for the whole process, so the history is capped and
/// the oldest records are evicted first.
pub const TERMINAL_HISTORY: usize = 256;

/// The deferred work a job performs when it fires.
///
/// Returning an error marks the job executed anyway; cleanup failures are
/// logged and never retried.
pub type JobAction =
    Box<dyn FnOnce() -> futures::future::BoxFuture<'static, Result<(), CleanupError>> + Send>;

/// The lifecycle state of a job, as reported by [`JobScheduler::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    /// Not yet due. `due_at` is the wall-clock estimate for display.
    Pending { due_at: DateTime<Utc> },
    /// Fired (the action ran, successfully or not).
    Executed { at: DateTime<Utc> },
    /// Cancelled before firing.
    Cancelled { at: DateTime<Utc> },
}

struct Job {
    tag: String,
    due: Instant,
    due_at: DateTime<Utc>,
    action: JobAction,
}

struct SchedulerState {
    pending: HashMap<String, Job>,
    /// Terminal records are retained so `status` keeps answering after a
    /// job fires or is cancelled, capped at [`TERMINAL_HISTORY`] entries.
    terminal: HashMap<String, JobStatus>,
    /// Insertion order of `terminal`, for eviction.
    terminal_order: VecDeque<String>,
}

impl SchedulerState {
    fn record_terminal(&mut self, id: String, status: JobStatus) {
        if self.terminal.insert(id.clone(), status).is_none() {
            self.terminal_order.push_back(id);
        }
        while self.terminal_order.len() > TERMINAL_HISTORY {
            if let Some(oldest) = self.terminal_order.pop_front() {
                self.terminal.remove(&oldest);
            }
        }
    }

    fn cancel_pending_with_tag(&mut self, tag: &str) -> usize {
        let ids: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, job)| job.tag == tag)
            .map(|(id, _)| id.clone())
            .collect();
        let now = Utc::now();
        let count = ids.len();
        for id in ids {
            self.pending.remove(&id);
            self.record_terminal(id, JobStatus::Cancelled { at: now });
        }
        count
    }
}

/// A scheduler for delayed one-shot jobs.
///
/// All mutation goes through one internal lock, so concurrent schedule and
/// cancel calls serialize. The tick loop sweeps for due jobs; a job fires
/// at most once, and cancellation of an already-fired job is a no-op.
pub struct JobScheduler {
    state: Mutex<SchedulerState>,
    tick: Duration,
}

impl JobScheduler {
    pub fn new() -> Self {
        Self::with_tick(DEFAULT_TICK)
    }

    pub fn with_tick(tick: Duration) -> Self {
        Self {
            state: Mutex::new(SchedulerState {
                pending: HashMap::new(),
                terminal: HashMap::new(),
                terminal_order: VecDeque::new(),
            }),
            tick,
        }
    }

    /// Schedule `action` to run once, `delay` from now. Any pending job
    /// with the same tag is cancelled and replaced, so a tag has at most
    /// one pending job. Returns the job id.
    pub async fn schedule(&self, tag: impl Into<String>, delay: Duration, action: JobAction) -> String {
        let id = Uuid::new_v4().to_string();
        let tag = tag.into();
        let due_at = Utc::now() + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::zero());
        info!(job_id = %id, tag = %tag, delay_secs = delay.as_secs(), "Scheduling job");

        let mut state = self.state.lock().await;
        let replaced = state.cancel_pending_with_tag(&tag);
        if replaced > 0 {
            debug!(tag = %tag, count = replaced, "Pending jobs replaced");
        }
        state.pending.insert(
            id.clone(),
            Job {
                tag,
                due: Instant::now() + delay,
                due_at,
                action,
            },
        );
        id
    }

    /// Cancel a pending job by id. Returns false if the job already fired,
    /// was already cancelled, or never existed.
    pub async fn cancel(&self, id: &str) -> bool {
        let mut state = self.state.lock().await;
        if state.pending.remove(id).is_some() {
            debug!(job_id = %id, "Job cancelled");
            state.record_terminal(id.to_string(), JobStatus::Cancelled { at: Utc::now() });
            true
        } else {
            false
        }
    }

    /// Cancel every pending job carrying `tag`. Returns how many were
    /// cancelled.
    pub async fn cancel_tag(&self, tag: &str) -> usize {
        let mut state = self.state.lock().await;
        let count = state.cancel_pending_with_tag(tag);
        if count > 0 {
            debug!(tag = %tag, count, "Jobs cancelled by tag");
        }
        count
    }

    /// The current status of a job, pending or terminal. `None` means the
    /// id was never scheduled here.
    pub async fn status(&self, id: &str) -> Option<JobStatus> {
        let state = self.state.lock().await;
        if let Some(job) = state.pending.get(id) {
            return Some(JobStatus::Pending { due_at: job.due_at });
        }
        state.terminal.get(id).cloned()
    }

    /// How many jobs have not yet fired or been cancelled.
    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Run every job that is due. Jobs are marked executed before their
    /// actions run, so a concurrent cancel of a firing job is a no-op.
    /// Returns how many jobs fired.
    pub async fn run_pending(&self) -> usize {
        let now = Instant::now();
        let due: Vec<(String, Job)> = {
            let mut state = self.state.lock().await;
            let ids: Vec<String> = state
                .pending
                .iter()
                .filter(|(_, job)| job.due <= now)
                .map(|(id, _)| id.clone())
                .collect();

            let fired_at = Utc::now();
            ids.into_iter()
                .filter_map(|id| {
                    let job = state.pending.remove(&id)?;
                    state.record_terminal(id.clone(), JobStatus::Executed { at: fired_at });
                    Some((id, job))
                })
                .collect()
        };

        let count = due.len();
        for (id, job) in due {
            info!(job_id = %id, tag = %job.tag, "Job firing");
            if let Err(e) = (job.action)().await {
                warn!(job_id = %id, error = %e, "Job action failed");
            }
        }
        count
    }

    /// Start the background tick loop. The loop holds a clone of `self` and
    /// sweeps for due jobs every tick until the handle is aborted.
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let scheduler = Arc::clone(self);
        let tick = self.tick;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                scheduler.run_pending().await;
            }
        })
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}
