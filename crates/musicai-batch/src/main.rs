//! Batch processing binary.
//!
//! Processes every file of `MUSIC_AI_INPUT_DIR` with `MUSIC_AI_WORKFLOW` and
//! writes results to `MUSIC_AI_OUTPUT_DIR`. Ctrl-C cancels in-flight waits.

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use musicai_batch::{process_folder, BatchConfig};
use musicai_client::MusicAiClient;

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("musicai=info,info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();
    info!("Starting musicai-batch");

    let config = match BatchConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid batch configuration: {}", e);
            std::process::exit(2);
        }
    };
    info!("Batch config: {:?}", config);

    let client = match MusicAiClient::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create Music.AI client: {}", e);
            std::process::exit(2);
        }
    };

    let cancel = config.options.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received shutdown signal, cancelling in-flight jobs");
            cancel.cancel();
        }
    });

    let summary = match process_folder(
        &client,
        &config.input_dir,
        &config.output_dir,
        &config.workflow,
        &config.options,
    )
    .await
    {
        Ok(s) => s,
        Err(e) => {
            error!("Batch run failed: {}", e);
            std::process::exit(1);
        }
    };

    for (path, message) in &summary.errored {
        warn!(file = %path.display(), "Not processed: {}", message);
    }
    info!(
        total = summary.total,
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        errored = summary.errored.len(),
        "Batch complete"
    );

    if !summary.is_clean() {
        std::process::exit(1);
    }
}
