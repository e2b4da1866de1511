//! apiprobe - sequential API conformance runner
//!
//! Runs a declarative scenario of HTTP steps against live services and
//! reports which steps passed, failed or were skipped.

use apiprobe::commands::{Commands, RunArgs};
use apiprobe::common::logging;
use apiprobe::report::ExitStatus;
use apiprobe::cli;
use clap::Parser;

#[derive(Parser)]
#[command(name = "apiprobe", about = "Sequential scenario-based API conformance runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default()));

    logging::init_cli(command.verbose());

    let status = match cli::dispatch(command).await {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitStatus::from_error(&e)
        }
    };

    std::process::exit(status.code());
}
