//! Folder batch processing.
//!
//! Each regular, non-hidden file directly under the input directory becomes
//! one task: upload, submit, wait, then download the results (or record the
//! file in the failure log). At most `concurrency` tasks run at once and a
//! task keeps its permit for its whole lifetime, including the wait.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, field, info, warn, Instrument};

use musicai_client::{ClientError, MusicAiClient, NamingMode, WaitOptions};
use musicai_models::{JobStatus, NewJob};

use crate::config::BatchOptions;
use crate::error::{BatchError, BatchResult};
use crate::failure_log::{FailureLog, FailureLogHandle};
use crate::logging::TaskLogger;
use crate::metrics::record_task;

/// Job parameter carrying the uploaded input URL.
pub const INPUT_URL_PARAM: &str = "inputUrl";

/// Result of a folder run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of input files dispatched
    pub total: usize,
    /// Inputs whose job succeeded and whose results were downloaded
    pub succeeded: Vec<PathBuf>,
    /// Inputs whose job ended FAILED, exactly as written to the failure log
    pub failed: Vec<PathBuf>,
    /// Inputs whose task hit an error, with the error message
    pub errored: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.errored.is_empty()
    }
}

#[derive(Debug)]
enum TaskOutcome {
    Succeeded,
    Failed,
    Errored(String),
}

impl TaskOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            TaskOutcome::Succeeded => "succeeded",
            TaskOutcome::Failed => "failed",
            TaskOutcome::Errored(_) => "errored",
        }
    }
}

/// State shared by every task of one run.
struct TaskContext {
    client: MusicAiClient,
    output_dir: PathBuf,
    workflow: String,
    wait: WaitOptions,
    delete_after: bool,
    failures: FailureLogHandle,
}

/// Regular, non-hidden files directly under `input_dir`, sorted by path.
pub async fn list_input_files(input_dir: &Path) -> BatchResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(input_dir)
        .await
        .map_err(|e| BatchError::io(input_dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| BatchError::io(input_dir, e))?
    {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        // Follows symlinks; dangling links and files removed since the
        // listing are not regular files.
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Skipping input that no longer resolves to a file");
                continue;
            }
            Err(e) => return Err(BatchError::io(&path, e)),
        };
        if metadata.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Process every input file of `input_dir` against `workflow`.
///
/// Per-file problems never abort the run; they are reported in the returned
/// summary. Errors are returned only when the run itself cannot proceed
/// (unreadable input directory, invalid options, failure log not writable).
pub async fn process_folder(
    client: &MusicAiClient,
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    workflow: &str,
    options: &BatchOptions,
) -> BatchResult<BatchSummary> {
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref();
    options.validate()?;
    if workflow.trim().is_empty() {
        return Err(BatchError::invalid_input("workflow cannot be empty"));
    }

    let inputs = list_input_files(input_dir).await?;
    info!(
        input_dir = %input_dir.display(),
        output_dir = %output_dir.display(),
        workflow = %workflow,
        files = inputs.len(),
        concurrency = options.concurrency,
        "Starting batch run"
    );

    let (failures, failure_log) = FailureLog::spawn(output_dir);
    let ctx = Arc::new(TaskContext {
        client: client.clone(),
        output_dir: output_dir.to_path_buf(),
        workflow: workflow.to_string(),
        wait: options.wait_options(),
        delete_after: options.delete_after,
        failures,
    });

    let semaphore = Arc::new(Semaphore::new(options.concurrency));
    let mut tasks = JoinSet::new();
    let mut summary = BatchSummary {
        total: inputs.len(),
        ..Default::default()
    };

    for input in inputs {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| BatchError::invalid_input("worker pool closed"))?;

        if options.cancel.is_cancelled() {
            warn!(file = %input.display(), "Batch cancelled, not starting file");
            summary
                .errored
                .push((input, ClientError::Cancelled.to_string()));
            continue;
        }

        let ctx = Arc::clone(&ctx);
        tasks.spawn(async move {
            let _permit = permit;
            let started = Instant::now();

            // Inner spawn so a panic is caught here, where the input is known.
            let outcome = match tokio::spawn(run_task(ctx, input.clone())).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(file = %input.display(), "Batch task panicked: {}", e);
                    TaskOutcome::Errored(format!("task panicked: {}", e))
                }
            };

            record_task(outcome.as_str(), started.elapsed().as_secs_f64());
            (input, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((input, TaskOutcome::Succeeded)) => summary.succeeded.push(input),
            Ok((_, TaskOutcome::Failed)) => {}
            Ok((input, TaskOutcome::Errored(message))) => summary.errored.push((input, message)),
            Err(e) => error!("Batch task aborted: {}", e),
        }
    }

    // Last sender goes away with the context; the writer then drains.
    drop(ctx);
    summary.failed = failure_log.finish().await?;

    summary.succeeded.sort();
    summary.failed.sort();
    summary.errored.sort();

    info!(
        total = summary.total,
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        errored = summary.errored.len(),
        "Batch run finished"
    );
    Ok(summary)
}

async fn run_task(ctx: Arc<TaskContext>, input: PathBuf) -> TaskOutcome {
    let mut logger = TaskLogger::new(&input, "process_file");
    let span = logger.create_span();

    let result = process_file(&ctx, &input, &mut logger)
        .instrument(span)
        .await;

    match result {
        Ok(JobStatus::Failed) => TaskOutcome::Failed,
        Ok(_) => TaskOutcome::Succeeded,
        Err(e) => {
            logger.log_error(&e.to_string());
            TaskOutcome::Errored(e.to_string())
        }
    }
}

async fn process_file(
    ctx: &TaskContext,
    input: &Path,
    logger: &mut TaskLogger,
) -> BatchResult<JobStatus> {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| BatchError::invalid_input(format!("no file name: {}", input.display())))?;

    logger.log_start("uploading input");
    let input_url = ctx.client.upload_file(input).await?;

    let new_job = NewJob::new(file_name, ctx.workflow.as_str()).with_param(INPUT_URL_PARAM, input_url);
    let job = ctx.client.submit_job(&new_job).await?;
    logger.set_job(&job.id);
    tracing::Span::current().record("job_id", field::display(&job.id));
    logger.log_progress("job submitted, waiting for completion");

    let job = ctx.client.wait_for_completion_with(&job.id, &ctx.wait).await?;

    match job.status {
        JobStatus::Failed => {
            logger.log_error("job failed");
            ctx.failures.record(input.to_path_buf()).await?;
            Ok(JobStatus::Failed)
        }
        JobStatus::Succeeded => {
            let stem = input
                .file_stem()
                .map(|s| s.to_os_string())
                .unwrap_or_else(|| input.as_os_str().to_os_string());
            let dest = ctx.output_dir.join(stem);

            let files = ctx
                .client
                .download_job_results_with(&job, &dest, NamingMode::ResultName)
                .await?;
            logger.log_progress(&format!(
                "downloaded {} result file(s) to {}",
                files.len(),
                dest.display()
            ));

            if ctx.delete_after {
                // Results are already on disk.
                match ctx.client.delete_job(&job.id).await {
                    Ok(()) => logger.log_progress("remote job deleted"),
                    Err(e) => logger.log_warning(&format!("failed to delete remote job: {}", e)),
                }
            }

            logger.log_completion("results downloaded");
            Ok(JobStatus::Succeeded)
        }
        other => Err(ClientError::invalid_state(format!(
            "wait returned non-terminal status {}",
            other
        ))
        .into()),
    }
}
