use serde::{Deserialize, Serialize};

/// Lifecycle of a background job (backup, restore, paginated export, OCR import).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Progress percentage, 0..=100.
    InProgress(u32),
    /// Human readable outcome, e.g. the path of the written file.
    Completed(String),
    Failed(String),
    /// Cancelled before any file write began.
    Cancelled,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed(_) | JobStatus::Failed(_) | JobStatus::Cancelled
        )
    }
}
