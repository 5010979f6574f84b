use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glci")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish a release to all configured cloud providers
    Publish {
        #[command(flatten)]
        release: ReleaseArgs,

        /// Package aliases used for scanning hints
        #[arg(long, value_name = "FILE")]
        aliases: Option<PathBuf>,
    },

    /// Remove a published release from all configured cloud providers
    Remove {
        #[command(flatten)]
        release: ReleaseArgs,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
pub struct ReleaseArgs {
    /// Garden Linux version to operate on (e.g., 1592.1)
    #[arg(id = "release_version", value_name = "VERSION")]
    pub version: String,

    /// Build commit, in full or its first 8 characters
    #[arg(value_name = "COMMIT")]
    pub commit: String,

    /// Flavors to operate on
    #[arg(long, value_name = "FILE")]
    pub flavors: Option<PathBuf>,

    /// Sources, targets and OCM repository
    #[arg(long, value_name = "FILE")]
    pub publishing: Option<PathBuf>,

    /// Provider credentials; falls back to base64-encoded YAML in GLCI_CREDENTIALS
    #[arg(long, value_name = "FILE")]
    pub credentials: Option<PathBuf>,
}
