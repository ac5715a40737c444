//! Failure log writer.
//!
//! One task owns `failed.json` for the whole run; workers hold a
//! [`FailureLogHandle`] and send the input path of every FAILED job. The file
//! is opened in append mode on the first message, so a run with no failures
//! leaves no file behind. Each entry is a single `write_all` of
//! `<path>\n`.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::{BatchError, BatchResult};

/// File name of the failure log inside the output directory.
pub const FAILURE_LOG_FILE_NAME: &str = "failed.json";

const CHANNEL_CAPACITY: usize = 64;

/// Sender side held by batch tasks.
#[derive(Debug, Clone)]
pub struct FailureLogHandle {
    tx: mpsc::Sender<PathBuf>,
}

impl FailureLogHandle {
    /// Queue `input` for the failure log.
    pub async fn record(&self, input: PathBuf) -> BatchResult<()> {
        self.tx
            .send(input)
            .await
            .map_err(|_| BatchError::FailureLogClosed)
    }
}

/// The running writer task.
#[derive(Debug)]
pub struct FailureLog {
    path: PathBuf,
    task: JoinHandle<BatchResult<Vec<PathBuf>>>,
}

impl FailureLog {
    /// Start the writer for `output_dir/failed.json`.
    pub fn spawn(output_dir: &Path) -> (FailureLogHandle, FailureLog) {
        let path = output_dir.join(FAILURE_LOG_FILE_NAME);
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(run_writer(path.clone(), rx));
        (FailureLogHandle { tx }, FailureLog { path, task })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the writer to drain. Returns every recorded path in order.
    ///
    /// Completes once all handles have been dropped.
    pub async fn finish(self) -> BatchResult<Vec<PathBuf>> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => {
                error!("Failure log writer panicked: {}", e);
                Err(BatchError::FailureLogClosed)
            }
        }
    }
}

async fn open_log(path: &Path) -> BatchResult<File> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BatchError::io(parent, e))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| BatchError::io(path, e))
}

async fn run_writer(path: PathBuf, mut rx: mpsc::Receiver<PathBuf>) -> BatchResult<Vec<PathBuf>> {
    let mut file: Option<File> = None;
    let mut recorded = Vec::new();

    while let Some(input) = rx.recv().await {
        let mut out = match file.take() {
            Some(f) => f,
            None => open_log(&path).await?,
        };

        let mut line = input.to_string_lossy().into_owned();
        line.push('\n');
        out.write_all(line.as_bytes())
            .await
            .map_err(|e| BatchError::io(&path, e))?;
        file = Some(out);

        debug!(path = %input.display(), "Recorded failed input");
        recorded.push(input);
    }

    if let Some(mut f) = file {
        f.flush().await.map_err(|e| BatchError::io(&path, e))?;
    }
    Ok(recorded)
}
