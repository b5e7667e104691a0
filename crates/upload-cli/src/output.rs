use crate::error::CliError;
use record_model::events::{progress::Progress, result::UploadResult};
use serde::Serialize;
use tracing::{error, info};
use upload_core::{config::UploadConfig, metrics::MetricsSnapshot};

/// Mirrors pipeline progress into the log.
pub fn log_progress(progress: &Progress) {
    match progress {
        Progress::Counting => info!("Counting records"),
        Progress::Processing {
            total,
            processed,
            message,
        } => info!(processed, total, "{message}"),
        Progress::Completed { total, message } => info!(total, "{message}"),
        Progress::Failed { message } => error!("{message}"),
    }
}

#[derive(Serialize)]
struct Report<'a> {
    result: &'a UploadResult,
    cancelled: bool,
    batches_sent: u64,
    batches_failed: u64,
    retries: u64,
}

pub fn render_result(
    result: &UploadResult,
    cancelled: bool,
    metrics: &MetricsSnapshot,
) -> Result<String, CliError> {
    let report = Report {
        result,
        cancelled,
        batches_sent: metrics.batches_sent,
        batches_failed: metrics.batches_failed,
        retries: metrics.retry_count,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn render_config(config: &UploadConfig) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(config)?)
}
