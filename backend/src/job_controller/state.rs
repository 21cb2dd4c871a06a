//! Manages the state of long-running, asynchronous background jobs.
//!
//! A bulk send runs outside the request/response cycle (see
//! `services/merge/start.rs`). The console polls its status, fetches the final
//! report and may cancel it while it runs.
//!
//! The main components are:
//! - `JobsState`: clonable, thread-safe handle on every job's status, final
//!   report and cancellation token. Injected into the Actix app in `main.rs`.
//!   Finished jobs are forgotten once they are older than the retention
//!   window; the sweep runs whenever a new job is registered.
//! - `JobUpdate`: status change sent by a background job to the updater.
//! - `start_job_updater`: long-running task applying `JobUpdate`s to the map.

use common::jobs::JobStatus;
use common::model::merge::DispatchSummary;
use log::debug;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::{mpsc, RwLock};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const UPDATE_CHANNEL_CAPACITY: usize = 100;

pub const DEFAULT_JOB_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Final report of a run and when it was stored.
#[derive(Clone, Debug)]
pub struct FinishedJob {
    pub summary: DispatchSummary,
    pub finished_at: Instant,
}

#[derive(Clone)]
pub struct JobsState {
    /// Job id to its current `JobStatus`. Only `start_job_updater` writes
    /// statuses after registration.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Final report of every finished run, kept for `/results/{job_id}`.
    pub reports: Arc<RwLock<HashMap<String, FinishedJob>>>,

    /// Cancellation handle of every job still running.
    pub cancels: Arc<RwLock<HashMap<String, CancellationToken>>>,

    /// Background tasks push their `JobUpdate`s here.
    pub tx: mpsc::Sender<JobUpdate>,

    /// How long a finished job stays visible.
    retention: Duration,
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

impl JobUpdate {
    pub fn new(job_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
        }
    }
}

impl JobsState {
    /// Empty state plus the receiving end the updater task must drain.
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        Self::with_retention(DEFAULT_JOB_RETENTION)
    }

    pub fn with_retention(retention: Duration) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let state = Self {
            jobs: Arc::default(),
            reports: Arc::default(),
            cancels: Arc::default(),
            tx,
            retention,
        };
        (state, rx)
    }

    /// Registers `job_id` as pending and hands back its cancellation token.
    pub async fn register(&self, job_id: &str) -> CancellationToken {
        self.prune_finished().await;
        let token = CancellationToken::new();
        self.jobs
            .write()
            .await
            .insert(job_id.to_string(), JobStatus::Pending);
        self.cancels
            .write()
            .await
            .insert(job_id.to_string(), token.clone());
        token
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }

    pub async fn report(&self, job_id: &str) -> Option<DispatchSummary> {
        self.reports
            .read()
            .await
            .get(job_id)
            .map(|finished| finished.summary.clone())
    }

    /// Signals a running job to stop. `false` when the job is unknown or
    /// already finished.
    pub async fn cancel(&self, job_id: &str) -> bool {
        match self.cancels.read().await.get(job_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Stores the final report and forgets the job's cancellation token.
    pub async fn finish(&self, job_id: &str, summary: DispatchSummary) {
        self.cancels.write().await.remove(job_id);
        self.reports.write().await.insert(
            job_id.to_string(),
            FinishedJob {
                summary,
                finished_at: Instant::now(),
            },
        );
    }

    /// Drops status and report of every job finished longer ago than the
    /// retention window. Returns how many jobs were forgotten.
    pub async fn prune_finished(&self) -> usize {
        let now = Instant::now();
        let mut reports = self.reports.write().await;
        let expired: Vec<String> = reports
            .iter()
            .filter(|(_, finished)| now.duration_since(finished.finished_at) >= self.retention)
            .map(|(job_id, _)| job_id.clone())
            .collect();
        if expired.is_empty() {
            return 0;
        }

        let mut jobs = self.jobs.write().await;
        for job_id in &expired {
            reports.remove(job_id);
            jobs.remove(job_id);
        }
        debug!("Forgot {} finished jobs", expired.len());
        expired.len()
    }
}

/// Applies `JobUpdate`s until every sender is gone.
///
/// A job that already reached a final status keeps it; late progress updates
/// are dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        if jobs.get(&update.job_id).is_some_and(JobStatus::is_finished) {
            debug!("Ignoring update for finished job {}", update.job_id);
            continue;
        }
        jobs.insert(update.job_id, update.status);
    }
}
