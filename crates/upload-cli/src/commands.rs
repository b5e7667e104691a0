use clap::{Args, Subcommand, ValueEnum};
use record_model::records::record::RecordKind;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Upload every record found in the input files
    Upload(UploadArgs),

    /// Print the effective pipeline configuration as JSON
    Config {
        #[arg(long, help = "TOML config file; defaults are used when omitted")]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct UploadArgs {
    #[arg(long, value_enum, help = "Record kind held by the input files")]
    pub kind: KindArg,

    /// JSON-lines files, one per sub-store, in priority order (e.g. inbox then sent)
    #[arg(long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    #[arg(long, env = "BATCHSYNC_BASE_URL", help = "Collector base URL")]
    pub base_url: String,

    #[arg(long, env = "BATCHSYNC_DEVICE_ID", help = "Device identifier stamped on every record")]
    pub device_id: String,

    #[arg(long, help = "TOML config file; defaults are used when omitted")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Send a single small batch from the first input and stop")]
    pub quick: bool,

    #[arg(long, requires = "quick", help = "Records sent by --quick (default from config)")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Sms,
    Contacts,
    CallLogs,
}

impl From<KindArg> for RecordKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Sms => RecordKind::Sms,
            KindArg::Contacts => RecordKind::Contacts,
            KindArg::CallLogs => RecordKind::CallLogs,
        }
    }
}
