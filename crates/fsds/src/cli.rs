use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing.
    ///
    /// If omitted, progress is shown as console output instead.
    #[arg(short, long, global = true)]
    pub trace: Option<TraceLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download and extract one quarter of the SEC Financial Statement Data Sets,
    /// then record the run in the download log.
    Fetch {
        /// Four-digit year, e.g. 2025.
        #[arg(short, long)]
        year: i32,

        /// Quarter of the year, 1 to 4.
        #[arg(short, long)]
        quarter: u32,

        /// Directory the raw archive is saved to.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Directory the archive is extracted under (one subdirectory per period).
        #[arg(long)]
        extract_dir: Option<PathBuf>,

        /// CSV file the run is logged to.
        #[arg(long)]
        log_path: Option<PathBuf>,

        /// Project root; overrides FSDS_ROOT.
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "UPPERCASE")]
pub enum TraceLevel {
    DEBUG,
    ERROR,
    INFO,
    TRACE,
    WARN,
}
