//! CLI command definitions
//!
//! Defines the clap commands for apiprobe. Running without a subcommand is
//! the same as `apiprobe run` with no options.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario and print the summary (default)
    Run(RunArgs),

    /// List the steps of a scenario without sending any request
    List {
        /// Scenario file (default: built-in book service suite)
        #[arg(long)]
        scenario: Option<PathBuf>,
    },

    /// Check a scenario against the configuration
    Validate {
        /// Scenario file (default: built-in book service suite)
        #[arg(long)]
        scenario: Option<PathBuf>,

        /// Configuration file (default: platform config dir)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Default)]
pub struct RunArgs {
    /// Scenario file (default: built-in book service suite)
    #[arg(long)]
    pub scenario: Option<PathBuf>,

    /// Configuration file (default: platform config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write the summary as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

impl Commands {
    /// Whether verbose logging was requested
    pub fn verbose(&self) -> bool {
        matches!(self, Commands::Run(args) if args.verbose)
    }
}
