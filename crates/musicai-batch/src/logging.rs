//! Structured per-file logging.
//!
//! Every message carries the input file, the remote job ID once known, and
//! the batch step.

use std::path::Path;

use tracing::{error, info, warn, Span};

use musicai_models::JobId;

/// Logger bound to one input file of a batch run.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    file: String,
    job_id: Option<String>,
    operation: String,
}

impl TaskLogger {
    pub fn new(file: &Path, operation: &str) -> Self {
        Self {
            file: file.display().to_string(),
            job_id: None,
            operation: operation.to_string(),
        }
    }

    /// Attach the remote job once it has been submitted.
    pub fn set_job(&mut self, job_id: &JobId) {
        self.job_id = Some(job_id.to_string());
    }

    fn job(&self) -> &str {
        self.job_id.as_deref().unwrap_or("-")
    }

    pub fn log_start(&self, message: &str) {
        info!(
            file = %self.file,
            job_id = %self.job(),
            operation = %self.operation,
            "Task started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            file = %self.file,
            job_id = %self.job(),
            operation = %self.operation,
            "Task progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            file = %self.file,
            job_id = %self.job(),
            operation = %self.operation,
            "Task warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            file = %self.file,
            job_id = %self.job(),
            operation = %self.operation,
            "Task error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            file = %self.file,
            job_id = %self.job(),
            operation = %self.operation,
            "Task completed: {}", message
        );
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    /// Span for the whole task. The job ID is recorded later through
    /// `Span::record`.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "batch_task",
            file = %self.file,
            operation = %self.operation,
            job_id = tracing::field::Empty
        )
    }
}
