use serde::{Deserialize, Serialize};

/// Lifecycle of a background job as polled by the console.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Whole-number percentage of recipients processed so far.
    InProgress(u32),
    Completed(String),
    Failed(String),
    Cancelled(String),
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed(_) | JobStatus::Failed(_) | JobStatus::Cancelled(_)
        )
    }
}
