use crate::{
    commands::{Commands, KindArg, UploadArgs},
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use record_model::{
    events::result::UploadResult,
    records::{
        call_log::CallLogRecord, contact::ContactRecord, record::Record, sms::SmsRecord,
    },
};
use serde::de::DeserializeOwned;
use std::{path::Path, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use upload_core::{
    config::UploadConfig,
    connectors::{
        http::HttpTransport,
        jsonl::JsonLinesSource,
        transport::{Destination, Transport},
    },
};
use upload_pipeline::uploader::BatchUploader;

mod commands;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(name = "batchsync", version, about = "Batch-upload device records to a collector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    // Logs go to stderr; stdout carries the JSON report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match run(cli.command).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "batchsync failed");
            ExitCode::GeneralError
        }
    };
    code.into()
}

async fn run(command: Commands) -> Result<ExitCode, CliError> {
    match command {
        Commands::Upload(args) => upload(args).await,
        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            println!("{}", output::render_config(&config)?);
            Ok(ExitCode::Success)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<UploadConfig, CliError> {
    let config = match path {
        Some(path) => {
            info!(path = %path.display(), "Loading config");
            UploadConfig::load(path)?
        }
        None => UploadConfig::default(),
    };
    Ok(config)
}

async fn upload(args: UploadArgs) -> Result<ExitCode, CliError> {
    let config = load_config(args.config.as_deref())?;
    let destination = Destination::parse(&args.base_url)?;
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config)?);

    match args.kind {
        KindArg::Sms => run_pipeline::<SmsRecord>(&args, config, transport, &destination).await,
        KindArg::Contacts => {
            run_pipeline::<ContactRecord>(&args, config, transport, &destination).await
        }
        KindArg::CallLogs => {
            run_pipeline::<CallLogRecord>(&args, config, transport, &destination).await
        }
    }
}

async fn run_pipeline<R>(
    args: &UploadArgs,
    config: UploadConfig,
    transport: Arc<dyn Transport>,
    destination: &Destination,
) -> Result<ExitCode, CliError>
where
    R: Record + DeserializeOwned,
{
    let uploader = BatchUploader::<R>::new(transport, config);
    let shutdown = ShutdownCoordinator::new(uploader.cancel_handle());
    shutdown.register_handlers();

    let source = Arc::new(JsonLinesSource::<R>::new(&args.inputs));
    info!(
        kind = %R::KIND,
        inputs = args.inputs.len(),
        quick = args.quick,
        "Starting upload"
    );

    let result = if args.quick {
        uploader
            .upload_quick(source, &args.device_id, destination, args.limit)
            .await
    } else {
        uploader
            .upload(
                source,
                &args.device_id,
                destination,
                Arc::new(output::log_progress),
            )
            .await
    };

    let cancelled = shutdown.is_shutdown_requested();
    println!(
        "{}",
        output::render_result(&result, cancelled, &uploader.metrics())?
    );

    match result {
        UploadResult::Failure { reason } => Err(CliError::Upload(reason)),
        UploadResult::Success { .. } if cancelled => Ok(ExitCode::ShutdownRequested),
        UploadResult::Success { .. } => Ok(ExitCode::Success),
    }
}
