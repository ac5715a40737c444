//! Waiting for jobs to reach a terminal status.
//!
//! The poller calls the lightweight status endpoint at a fixed interval and
//! fetches the full job once it is SUCCEEDED or FAILED. Waits can be bounded
//! by a deadline and interrupted through a [`CancellationToken`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use musicai_models::{Job, JobId, JobStatus};

use crate::client::MusicAiClient;
use crate::error::{ClientError, ClientResult};
use crate::metrics::record_poll_error;

/// What to do when a poll request fails.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PollErrorPolicy {
    /// Return the error to the caller immediately.
    #[default]
    Propagate,
    /// Log transport errors and poll again after `delay`.
    ///
    /// With `max_consecutive: None` the poller never gives up on its own;
    /// otherwise the error is returned once that many polls in a row failed.
    RetryAfter {
        delay: Duration,
        max_consecutive: Option<u32>,
    },
}

/// Options for a single wait.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Interval between status polls
    pub interval: Duration,
    /// Upper bound on the whole wait
    pub deadline: Option<Duration>,
    /// Cancels the wait when triggered
    pub cancel: CancellationToken,
    /// Handling of failed poll requests
    pub on_error: PollErrorPolicy,
}

impl WaitOptions {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            cancel: CancellationToken::new(),
            on_error: PollErrorPolicy::Propagate,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn retry_on_error(mut self, delay: Duration, max_consecutive: Option<u32>) -> Self {
        self.on_error = PollErrorPolicy::RetryAfter {
            delay,
            max_consecutive,
        };
        self
    }
}

enum Step {
    Status(JobStatus),
    Fetched(Job),
}

impl MusicAiClient {
    /// Block until the job is terminal, polling at the configured interval.
    ///
    /// Transport errors are returned immediately. There is no deadline; use
    /// [`MusicAiClient::wait_for_completion_with`] to bound the wait.
    pub async fn wait_for_completion(&self, job_id: &JobId) -> ClientResult<Job> {
        let options = WaitOptions::new(self.config().poll_interval);
        self.wait_for_completion_with(job_id, &options).await
    }

    /// Block until the job is terminal, honouring deadline, cancellation and
    /// error policy from `options`.
    pub async fn wait_for_completion_with(
        &self,
        job_id: &JobId,
        options: &WaitOptions,
    ) -> ClientResult<Job> {
        let poll = self.poll_until_terminal(job_id, options);
        match options.deadline {
            Some(limit) => tokio::time::timeout(limit, poll)
                .await
                .map_err(|_| ClientError::Timeout(limit))?,
            None => poll.await,
        }
    }

    async fn poll_until_terminal(&self, job_id: &JobId, options: &WaitOptions) -> ClientResult<Job> {
        let mut last_seen: Option<JobStatus> = None;
        let mut consecutive_errors = 0u32;

        loop {
            if options.cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            let step = match last_seen {
                Some(status) if status.is_terminal() => self.get_job(job_id).await.map(Step::Fetched),
                _ => self
                    .get_job_status(job_id)
                    .await
                    .map(|snapshot| Step::Status(snapshot.status)),
            };

            let delay = match step {
                Ok(Step::Fetched(job)) if job.is_terminal() => return Ok(job),
                Ok(Step::Fetched(job)) => {
                    // Full read lagging behind the status endpoint.
                    debug!(job_id = %job_id, status = %job.status, "Job not terminal yet in full read");
                    consecutive_errors = 0;
                    options.interval
                }
                Ok(Step::Status(status)) => {
                    consecutive_errors = 0;
                    match last_seen {
                        Some(prev) if prev.is_regression_to(status) => {
                            warn!(
                                job_id = %job_id,
                                from = %prev,
                                to = %status,
                                "Ignoring backward job status transition"
                            );
                        }
                        Some(prev) if prev == status => {}
                        _ => {
                            debug!(job_id = %job_id, status = %status, "Job status changed");
                            last_seen = Some(status);
                        }
                    }
                    if status.is_terminal() && last_seen == Some(status) {
                        continue;
                    }
                    options.interval
                }
                Err(e) => match &options.on_error {
                    PollErrorPolicy::Propagate => return Err(e),
                    PollErrorPolicy::RetryAfter { .. } if !e.is_transport() => return Err(e),
                    PollErrorPolicy::RetryAfter {
                        delay,
                        max_consecutive,
                    } => {
                        consecutive_errors += 1;
                        if max_consecutive.is_some_and(|max| consecutive_errors >= max) {
                            warn!(
                                job_id = %job_id,
                                attempts = consecutive_errors,
                                "Giving up polling after consecutive errors: {}", e
                            );
                            return Err(e);
                        }
                        record_poll_error();
                        warn!(
                            job_id = %job_id,
                            attempt = consecutive_errors,
                            "Failed to poll job, retrying in {:?}: {}", delay, e
                        );
                        *delay
                    }
                },
            };

            tokio::select! {
                biased;
                _ = options.cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
