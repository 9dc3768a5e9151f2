use std::path::PathBuf;

use clap::Parser;

/// Download every file visible in a rendered folder-listing page,
/// one at a time, into a local directory.
#[derive(Debug, Parser)]
#[command(name = "skimmer")]
#[command(about = "Sequential downloader for rendered folder listings", long_about = None)]
pub struct Args {
    /// URL of the folder listing page, or a local HTML file with --local.
    pub listing: String,

    /// Directory to download files into.
    #[arg(short, long, default_value = "downloads")]
    pub output: PathBuf,

    /// Treat LISTING as a local HTML file instead of a URL.
    #[arg(long)]
    pub local: bool,

    /// Base URL for resolving relative links when reading a local file.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Only keep entries whose display text contains this substring.
    #[arg(long, value_name = "SUBSTR")]
    pub filter: Option<String>,

    /// Milliseconds to pause between one file and the next.
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Query parameter appended to each file URL to force a raw download.
    #[arg(long, value_name = "K=V", conflicts_with = "no_raw_param")]
    pub raw_param: Option<String>,

    /// Do not append a forced-download query parameter at all.
    #[arg(long)]
    pub no_raw_param: bool,

    /// Optional RON settings file; explicit flags override its values.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write logs to skimmer.log in the working directory.
    #[arg(long)]
    pub log_file: bool,

    /// Log debug detail.
    #[arg(short, long)]
    pub verbose: bool,
}
