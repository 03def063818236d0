use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// collnav - browse catalogued collections and their plugins
#[derive(Parser, Debug)]
#[command(name = "collnav")]
#[command(about = "A terminal browser for catalogued collection and plugin documentation")]
#[command(version)]
pub struct Cli {
    /// JSON settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Collection doc cache file
    #[arg(long, global = true)]
    pub cache_path: Option<PathBuf>,

    /// Disable color
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Collections were catalogued inside an execution environment
    #[arg(long, global = true)]
    pub execution_environment: bool,

    /// Write logs here
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Browse collections (the default)
    Collections {
        /// Read the catalog document from a file
        #[arg(long)]
        catalog_file: Option<PathBuf>,

        /// Command printing the catalog document, after `--`
        #[arg(last = true)]
        command: Vec<String>,
    },
    /// Inspect or reset the collection doc cache
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCommands {
    /// Open the cache (rebuilding it if stale) and print its version
    Check,
    /// Delete and rebuild the cache
    Clear,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
