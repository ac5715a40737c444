//! Shared data models for the Music.AI API client.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs, job status snapshots and job submissions
//! - Workflows and application metadata
//! - Upload tickets
//! - List query building (repeated keys for OR filters)
//! - The download manifest written next to fetched results

pub mod application;
pub mod job;
pub mod manifest;
pub mod query;
pub mod upload;
pub mod utils;
pub mod workflow;

// Re-export common types
pub use application::ApplicationInfo;
pub use job::{Job, JobId, JobList, JobStatus, JobStatusSnapshot, NewJob};
pub use manifest::{DownloadManifest, MANIFEST_FILE_NAME};
pub use query::ListQuery;
pub use upload::UploadTicket;
pub use utils::{extract_file_extension_from_url, extract_name_from_url, is_http_url, sanitize_file_name};
pub use workflow::{Workflow, WorkflowList};
