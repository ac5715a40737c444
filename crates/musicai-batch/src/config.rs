//! Batch configuration.

use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use musicai_client::WaitOptions;

use crate::error::{BatchError, BatchResult};

/// Tuning for a folder run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum files in flight at once
    pub concurrency: usize,
    /// Delete the remote job after its results are downloaded
    pub delete_after: bool,
    /// Interval between status polls
    pub poll_interval: Duration,
    /// Delay before polling again after a failed poll request
    pub poll_error_delay: Duration,
    /// Give up a file after this many failed polls in a row (None = never)
    pub max_poll_errors: Option<u32>,
    /// Upper bound on waiting for a single job
    pub task_timeout: Option<Duration>,
    /// Shared cancellation for every in-flight wait
    pub cancel: CancellationToken,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 5,
            delete_after: true,
            poll_interval: Duration::from_secs(5),
            poll_error_delay: Duration::from_secs(5),
            max_poll_errors: None,
            task_timeout: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl BatchOptions {
    /// Create options from environment variables.
    pub fn from_env() -> BatchResult<Self> {
        let defaults = Self::default();
        let options = Self {
            concurrency: env_parse("MUSIC_AI_BATCH_CONCURRENCY")?.unwrap_or(defaults.concurrency),
            delete_after: match std::env::var("MUSIC_AI_BATCH_DELETE_AFTER") {
                Ok(v) => parse_bool("MUSIC_AI_BATCH_DELETE_AFTER", &v)?,
                Err(_) => defaults.delete_after,
            },
            poll_interval: env_parse("MUSIC_AI_BATCH_POLL_INTERVAL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            poll_error_delay: env_parse("MUSIC_AI_BATCH_POLL_ERROR_DELAY_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_error_delay),
            max_poll_errors: env_parse("MUSIC_AI_BATCH_MAX_POLL_ERRORS")?,
            task_timeout: env_parse("MUSIC_AI_BATCH_TASK_TIMEOUT_SECS")?.map(Duration::from_secs),
            cancel: defaults.cancel,
        };
        options.validate()?;
        Ok(options)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_delete_after(mut self, delete_after: bool) -> Self {
        self.delete_after = delete_after;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_poll_error_delay(mut self, delay: Duration, max_consecutive: Option<u32>) -> Self {
        self.poll_error_delay = delay;
        self.max_poll_errors = max_consecutive;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn validate(&self) -> BatchResult<()> {
        if self.concurrency == 0 {
            return Err(BatchError::invalid_input("concurrency must be at least 1"));
        }
        if self.poll_interval.is_zero() {
            return Err(BatchError::invalid_input("poll interval must be greater than zero"));
        }
        Ok(())
    }

    /// Wait options for one job: transport errors are retried, never propagated
    /// unless `max_poll_errors` is reached.
    pub(crate) fn wait_options(&self) -> WaitOptions {
        let mut options = WaitOptions::new(self.poll_interval)
            .with_cancellation(self.cancel.clone())
            .retry_on_error(self.poll_error_delay, self.max_poll_errors);
        if let Some(limit) = self.task_timeout {
            options = options.with_deadline(limit);
        }
        options
    }
}

/// Full configuration of the batch binary.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Workflow slug every file is submitted to
    pub workflow: String,
    pub options: BatchOptions,
}

impl BatchConfig {
    /// Create config from environment variables.
    pub fn from_env() -> BatchResult<Self> {
        Ok(Self {
            input_dir: required("MUSIC_AI_INPUT_DIR")?.into(),
            output_dir: required("MUSIC_AI_OUTPUT_DIR")?.into(),
            workflow: required("MUSIC_AI_WORKFLOW")?,
            options: BatchOptions::from_env()?,
        })
    }
}

fn required(name: &str) -> BatchResult<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(BatchError::invalid_input(format!("{} must be set", name))),
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> BatchResult<Option<T>> {
    match std::env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| BatchError::invalid_input(format!("{} has an invalid value: {}", name, v))),
        Err(_) => Ok(None),
    }
}

fn parse_bool(name: &str, value: &str) -> BatchResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BatchError::invalid_input(format!(
            "{} must be a boolean, got {}",
            name, value
        ))),
    }
}
