//! Async client for the Music.AI job API.
//!
//! This crate provides:
//! - Authenticated gateway calls (uploads, jobs, workflows, application info)
//! - Job polling with deadlines, cancellation and error policies
//! - Result download with a `workflow.result.json` manifest
//! - Request tracing spans and metrics

pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod metrics;
pub mod poller;

pub use client::MusicAiClient;
pub use config::{ClientConfig, NamingMode};
pub use download::local_file_name;
pub use error::{ClientError, ClientResult};
pub use poller::{PollErrorPolicy, WaitOptions};

pub use musicai_models as models;
