//! Folder batch processing for the Music.AI job API.
//!
//! This crate provides:
//! - A bounded worker pool that runs upload, submit, wait and download per file
//! - A single-owner failure log (`failed.json`) fed over a channel
//! - Env-driven configuration and structured per-file logging

pub mod config;
pub mod error;
pub mod failure_log;
pub mod logging;
pub mod metrics;
pub mod orchestrator;

pub use config::{BatchConfig, BatchOptions};
pub use error::{BatchError, BatchResult};
pub use failure_log::{FailureLog, FailureLogHandle, FAILURE_LOG_FILE_NAME};
pub use logging::TaskLogger;
pub use orchestrator::{list_input_files, process_folder, BatchSummary, INPUT_URL_PARAM};
