//! gitup CLI - Upload a local directory to a GitHub repository
//!
//! Creates the repository when it does not exist, then uploads every file
//! whose content differs from the remote copy.
//!
//! Usage:
//!   gitup -A <TOKEN>                       - Save the API token
//!   gitup -p <DIR> [-I <PATTERN>...]       - Sync a directory (asks for the repository)
//!   gitup -p <DIR> -r <NAME> --yes         - Non-interactive sync

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("gitup={}", log_level).parse()?),
        )
        .with_target(false)
        .init();

    cli::commands::run(cli)
}
