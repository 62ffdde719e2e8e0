//! CLI definitions and command implementation for gitup.

pub mod commands;

use clap::Parser;
use std::path::PathBuf;

/// gitup - Upload a local directory to a GitHub repository
#[derive(Parser, Debug)]
#[command(name = "gitup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the local directory to upload
    #[arg(short, long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// GitHub API token (saved for future runs)
    #[arg(short = 'A', long = "api", value_name = "TOKEN")]
    pub api: Option<String>,

    /// Files or folders to ignore (substring match on the relative path)
    #[arg(short = 'I', long, value_name = "PATTERN", num_args = 0..)]
    pub ignore: Vec<String>,

    /// Repository to create or upload to (prompted when omitted)
    #[arg(short, long, value_name = "NAME")]
    pub repo: Option<String>,

    /// Upload without asking to confirm the target repository
    #[arg(short, long)]
    pub yes: bool,

    /// Create the repository as private if it does not exist yet
    #[arg(long)]
    pub private: bool,

    /// Number of parallel uploads (default: from config, 1)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Config file (default: ~/.config/gitup/gitup.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
