//! CLI definitions for flowscribe.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// flowscribe CLI.
#[derive(Parser)]
#[command(name = "flowscribe")]
#[command(about = "Reconstruct workflow definitions from a visual workflow editor")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "flowscribe.toml", global = true, env = "FLOWSCRIBE_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Extract every workflow from the editor into a new snapshot session
    Extract {
        /// Editor page listing the workflows (overrides config)
        #[arg(long)]
        editor_url: Option<String>,

        /// Only extract workflows whose name contains this text
        #[arg(long)]
        filter: Option<String>,

        /// Stop after this many workflows
        #[arg(long)]
        max_workflows: Option<usize>,

        /// Capture one screenshot per saved workflow
        #[arg(long)]
        screenshots: bool,

        /// Snapshot root directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare two workflow snapshot files
    Diff {
        /// Older snapshot
        old: PathBuf,

        /// Newer snapshot
        new: PathBuf,
    },

    /// Validate the configuration and print the effective settings
    CheckConfig,
}
