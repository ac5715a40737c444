//! Job definitions as exposed by the remote API.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Unique identifier for a remote job.
///
/// Opaque to the client; issued by the service on submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Job processing status.
///
/// Transitions are one-directional: `Queued -> Started -> {Succeeded, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Waiting for the service to pick the job up
    #[default]
    Queued,
    /// Being processed
    Started,
    /// Finished, results available
    Succeeded,
    /// Finished without results
    Failed,
}

impl JobStatus {
    /// Get wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Started => "STARTED",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// Check if this is a terminal state (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// Position in the lifecycle. Both terminal states share the last rank.
    pub fn rank(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Started => 1,
            JobStatus::Succeeded | JobStatus::Failed => 2,
        }
    }

    /// True if moving from `self` to `next` would go backwards in the lifecycle.
    pub fn is_regression_to(&self, next: JobStatus) -> bool {
        next.rank() < self.rank() || (self.is_terminal() && next != *self)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a remote job.
///
/// Owned and mutated by the service only; a client copy may be stale
/// between polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Human readable job name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Workflow slug the job runs against
    #[serde(default, deserialize_with = "null_as_default")]
    pub workflow: String,

    /// Input parameters the job was submitted with
    #[serde(default, deserialize_with = "null_as_default")]
    pub workflow_params: BTreeMap<String, Value>,

    /// Current status
    #[serde(default)]
    pub status: JobStatus,

    /// Named outputs (URL or literal value), filled once terminal
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check if the job finished successfully.
    pub fn is_succeeded(&self) -> bool {
        self.status == JobStatus::Succeeded
    }

    /// Check if the job failed.
    pub fn is_failed(&self) -> bool {
        self.status == JobStatus::Failed
    }
}

/// Response of the lightweight status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobStatusSnapshot {
    pub id: JobId,
    pub status: JobStatus,
}

/// Job submission body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    /// Job name
    pub name: String,
    /// Workflow slug
    pub workflow: String,
    /// Workflow input parameters
    pub params: BTreeMap<String, Value>,
    /// Output name -> caller-owned storage URL the service should write to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_results_to: Option<BTreeMap<String, String>>,
}

impl NewJob {
    /// Create a new job submission.
    pub fn new(name: impl Into<String>, workflow: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workflow: workflow.into(),
            params: BTreeMap::new(),
            copy_results_to: None,
        }
    }

    /// Add an input parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Replace all input parameters.
    pub fn with_params(mut self, params: BTreeMap<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Persist named outputs to caller-supplied locations.
    pub fn with_copy_results_to(mut self, targets: BTreeMap<String, String>) -> Self {
        self.copy_results_to = Some(targets);
        self
    }
}

/// Job listing. The service answers with either a bare array or an envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JobList {
    Bare(Vec<Job>),
    Envelope { jobs: Vec<Job> },
}

impl JobList {
    pub fn into_vec(self) -> Vec<Job> {
        match self {
            JobList::Bare(jobs) | JobList::Envelope { jobs } => jobs,
        }
    }
}

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
