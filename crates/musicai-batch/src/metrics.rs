//! Batch metrics.

use metrics::{counter, histogram};

pub mod names {
    /// Finished batch tasks by outcome.
    pub const TASKS_TOTAL: &str = "musicai_batch_tasks_total";

    /// Wall time of a batch task in seconds.
    pub const TASK_DURATION_SECONDS: &str = "musicai_batch_task_duration_seconds";
}

/// Record a finished task. `outcome` is `succeeded`, `failed` or `errored`.
pub fn record_task(outcome: &'static str, duration_secs: f64) {
    counter!(names::TASKS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(names::TASK_DURATION_SECONDS, "outcome" => outcome).record(duration_secs);
}
