use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::integration::DEFAULT_RETRIES;

pub const DEFAULT_REPORT_FILE: &str = "appmap-findings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "appmap-scanner",
    version,
    about = "Scan AppMaps for code behavior findings",
    long_about = "appmap-scanner evaluates performance, security and maintainability rules against recorded AppMap execution traces."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan AppMaps for code behavior findings
    Scan(ScanArgs),
    /// Upload a findings report to the AppMap server
    Upload(UploadArgs),
    /// List the finding statuses known to the AppMap server
    FindingStatus(FindingStatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Directory to recursively inspect for AppMaps
    #[arg(short = 'd', long)]
    pub appmap_dir: Option<PathBuf>,

    /// Single AppMap file to scan
    #[arg(short = 'f', long)]
    pub appmap_file: Option<PathBuf>,

    /// Configuration file (YAML or JSON); the default rules when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// File to write the findings report to
    #[arg(long, default_value = DEFAULT_REPORT_FILE)]
    pub report_file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Terminal)]
    pub format: OutputFormat,

    /// Report every finding, including duplicates of the same hash
    #[arg(long)]
    pub all: bool,

    /// Do not ask the server which findings are already known
    #[arg(long)]
    pub offline: bool,

    /// Exit with status 1 if there are any new findings
    #[arg(long)]
    pub fail: bool,

    /// App to fetch finding status for; read from appmap.yml by default
    #[arg(long)]
    pub app: Option<String>,

    /// Retries for transient server errors
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,
}

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// Findings report to upload
    #[arg(long, default_value = DEFAULT_REPORT_FILE)]
    pub report_file: PathBuf,

    /// App to publish the findings for; read from appmap.yml by default
    #[arg(long)]
    pub app: Option<String>,

    /// Base directory of the AppMaps named in the report
    #[arg(short = 'd', long)]
    pub appmap_dir: Option<PathBuf>,

    /// Retries for transient server errors
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,
}

#[derive(Args, Debug, Clone)]
pub struct FindingStatusArgs {
    /// App to list finding status for; read from appmap.yml by default
    #[arg(long)]
    pub app: Option<String>,

    /// Directory to start the appmap.yml search from
    #[arg(short = 'd', long)]
    pub appmap_dir: Option<PathBuf>,

    /// Retries for transient server errors
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,
}
