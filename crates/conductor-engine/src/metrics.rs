use conductor_core::TaskStatus;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Task outcome counters for one engine instance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TaskCounters {
    /// Tasks accepted by `submit`/`submit_batch`.
    pub submitted: u64,
    /// Tasks that completed successfully.
    pub succeeded: u64,
    /// Tasks that ended in a terminal failure.
    pub failed: u64,
    /// Tasks whose final failure was a deadline expiry.
    pub timed_out: u64,
    /// Tasks denied by the access policy.
    pub rejected: u64,
}

/// Tracks task outcomes across concurrent submissions.
pub struct EngineMetrics {
    counters: RwLock<TaskCounters>,
}

impl EngineMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(TaskCounters::default()),
        }
    }

    /// Count an accepted task.
    pub async fn record_submitted(&self) {
        self.counters.write().await.submitted += 1;
    }

    /// Count a terminal outcome.
    pub async fn record_outcome(&self, status: TaskStatus) {
        let mut counters = self.counters.write().await;
        match status {
            TaskStatus::Success => counters.succeeded += 1,
            TaskStatus::Failed => counters.failed += 1,
            TaskStatus::Timeout => counters.timed_out += 1,
            TaskStatus::Rejected => counters.rejected += 1,
        }
    }

    /// Copy out the current counters.
    pub async fn snapshot(&self) -> TaskCounters {
        *self.counters.read().await
    }

    /// Serialize the counters for dashboards.
    pub async fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self.snapshot().await)
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
