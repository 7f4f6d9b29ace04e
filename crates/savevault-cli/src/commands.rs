use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "savevault")]
#[command(about = "Find installed games and their save folders", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Discover installed games (press Enter to stop early)
    Discover(DiscoverArgs),
    /// Show which rule decides whether a folder or executable is skipped
    Explain {
        /// Folder or executable to classify
        path: PathBuf,
    },
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Known-game catalog (TOML); overrides `catalog_path` from the config
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Extra folder to crawl; may be repeated
    #[arg(long = "root")]
    pub roots: Vec<String>,

    /// Deepest folder level crawled below each root
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Only crawl the --root folders and configured search roots
    #[arg(long)]
    pub no_system_roots: bool,

    /// Skip the installed-programs registry
    #[arg(long)]
    pub no_registry: bool,

    /// Write the results to a CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Stop the scan after this many seconds
    #[arg(long)]
    pub time_limit: Option<u64>,
}
