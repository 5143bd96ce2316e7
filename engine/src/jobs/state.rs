//! Shared state of background jobs.
//!
//! [`JobsState`] is a clonable handle onto the status map. Workers never
//! write the map directly while running: they push [`JobUpdate`]s into the
//! mpsc channel and [`start_job_updater`] applies them. The scheduling task
//! writes the final status itself once the worker has returned.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::jobs::JobStatus;
use tokio::sync::{mpsc, RwLock};

#[derive(Clone)]
pub struct JobsState {
    /// Job id to its latest status.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,
    /// Progress channel consumed by [`start_job_updater`].
    pub tx: mpsc::Sender<JobUpdate>,
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

impl JobsState {
    /// Creates the state and its receiving end. The receiver must be handed
    /// to [`start_job_updater`].
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Creates the state and spawns its updater on the current runtime.
    pub fn spawn(capacity: usize) -> Self {
        let (state, rx) = Self::new(capacity);
        tokio::spawn(start_job_updater(state.clone(), rx));
        state
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }

    pub(crate) async fn set(&self, job_id: &str, status: JobStatus) {
        self.jobs.write().await.insert(job_id.to_string(), status);
    }
}

/// Applies progress updates until every sender is dropped. Updates for a job
/// that already finished are discarded.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        if jobs.get(&update.job_id).is_some_and(JobStatus::is_finished) {
            continue;
        }
        jobs.insert(update.job_id, update.status);
    }
}

/// Returned by every `schedule_*` call.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub job_id: String,
    cancel: Arc<AtomicBool>,
}

impl JobHandle {
    pub(crate) fn new(job_id: String) -> Self {
        Self {
            job_id,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Requests cancellation. Has no effect once the job's file write began.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub(crate) fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }
}
