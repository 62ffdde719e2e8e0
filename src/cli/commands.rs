//! Command implementation for the gitup CLI.
//!
//! Order of a run:
//! - credentials: `-A` token (saved) or the persisted record
//! - local path and repository name, confirmed before any remote call
//! - repository lookup/creation, traversal and per-file reconciliation

use super::Cli;
use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{Confirm, Input};
use gitup::config::default_config_path;
use gitup::sync::FileOutcome;
use gitup::{
    Config, Credential, CredentialStore, GitHubClient, IgnoreList, SyncOptions, SyncReport,
    Syncer,
};
use std::io::{self, BufRead, IsTerminal};
use std::sync::Arc;

/// Print the welcome banner.
fn show_banner() {
    println!("{}", "===========================================".cyan());
    println!("{}", "           GITHUB UPLOAD TOOL".cyan().bold());
    println!("{}", "===========================================".cyan());
    println!();
}

/// Token from `-A` (persisted on the way) or from the credential record.
pub fn resolve_credential(
    store: &CredentialStore,
    api_arg: Option<&str>,
) -> Result<Option<Credential>> {
    if let Some(credential) = api_arg.and_then(Credential::new) {
        store.save(&credential)?;
        println!(
            "  {} GitHub API token has been saved to {}",
            "✓".green(),
            store.path().display()
        );
        return Ok(Some(credential));
    }
    store.load()
}

/// Repository name from `--repo`, otherwise read from stdin.
fn resolve_repo_name(repo_arg: Option<&str>) -> Result<Option<String>> {
    let name = match repo_arg {
        Some(name) => name.to_string(),
        None if io::stdin().is_terminal() => Input::<String>::new()
            .with_prompt("Enter the name of the repository to create or upload to")
            .allow_empty(true)
            .interact_text()?,
        None => {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line
        }
    };
    Ok(normalize_repo_name(&name))
}

fn normalize_repo_name(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Default-deny: uploads only after `--yes` or an explicit "y" at the prompt.
fn confirm_target(repo_name: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        println!(
            "{}",
            "Refusing to upload without confirmation. Pass --yes to confirm the repository."
                .yellow()
        );
        return Ok(false);
    }
    let confirmed = Confirm::new()
        .with_prompt(format!("Upload files to repository '{}'?", repo_name))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

/// Merge command-line overrides into the config-derived options.
fn sync_options(config: &Config, cli: &Cli) -> SyncOptions {
    let mut options = SyncOptions::from(config);
    if cli.private {
        options.private = true;
    }
    if let Some(jobs) = cli.jobs {
        options.jobs = jobs.max(1);
    }
    options
}

/// Run one sync.
pub fn run(cli: Cli) -> Result<()> {
    show_banner();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = Config::load_or_default(&config_path)?;
    let store = CredentialStore::new(config.credentials_path());

    let Some(credential) = resolve_credential(&store, cli.api.as_deref())? else {
        println!(
            "{}",
            "GitHub API token is required. Please set it using -A flag.".red()
        );
        return Ok(());
    };

    let Some(root) = cli.path.clone() else {
        println!(
            "{}",
            "Path to the local directory is required. Use -p to specify the path.".red()
        );
        return Ok(());
    };
    if !root.is_dir() {
        println!("{} {}", "Invalid path provided:".red(), root.display());
        return Ok(());
    }

    let Some(repo_name) = resolve_repo_name(cli.repo.as_deref())? else {
        println!("{}", "Repository name is required.".red());
        return Ok(());
    };
    if !confirm_target(&repo_name, cli.yes)? {
        println!("{}", "Nothing uploaded.".yellow());
        return Ok(());
    }

    let client = GitHubClient::from_config(&config, credential.token())
        .context("Cannot create GitHub client")?;
    let syncer = Syncer::new(Arc::new(client), sync_options(&config, &cli))
        .with_comparator(config.compare.comparator());
    let ignore = IgnoreList::new(cli.ignore.iter().cloned());

    println!("{}", format!("Syncing {} ...", root.display()).cyan());
    let report = syncer.run(&repo_name, &root, &ignore)?;
    print_summary(&report);

    Ok(())
}

fn print_summary(report: &SyncReport) {
    println!();
    if let Some(repo) = &report.repository {
        let verb = if repo.created { "Created" } else { "Updated" };
        println!("{} {}", verb.green().bold(), repo.full_name.white().bold());
    }
    println!(
        "  {} uploaded ({} new, {} changed), {} unchanged, {} failed",
        report.uploaded().to_string().green(),
        report.created(),
        report.updated(),
        report.skipped().to_string().cyan(),
        report.failed().to_string().red()
    );

    for failure in report.failures() {
        if let FileOutcome::Failed { attempts, error } = &failure.outcome {
            println!(
                "  {} {} {}",
                "✗".red(),
                failure.relative_path,
                format!("({} attempts: {})", attempts, error).dimmed()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_api_argument_is_persisted() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = CredentialStore::new(temp_dir.path().join("credentials.json"));

        let credential = resolve_credential(&store, Some("ghp_new"))?;
        assert_eq!(credential.as_ref().map(Credential::token), Some("ghp_new"));

        // Next run without -A picks up the saved token
        let again = resolve_credential(&store, None)?;
        assert_eq!(again, credential);
        Ok(())
    }

    #[test]
    fn test_no_token_anywhere() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = CredentialStore::new(temp_dir.path().join("credentials.json"));
        assert!(resolve_credential(&store, None)?.is_none());
        assert!(resolve_credential(&store, Some("  "))?.is_none());
        Ok(())
    }

    #[test]
    fn test_repo_name_normalization() {
        assert_eq!(normalize_repo_name("  vault \n"), Some("vault".to_string()));
        assert_eq!(normalize_repo_name(" \n"), None);
        assert_eq!(
            resolve_repo_name(Some(" site ")).unwrap(),
            Some("site".to_string())
        );
    }

    #[test]
    fn test_yes_flag_confirms() {
        assert!(confirm_target("vault", true).unwrap());
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = Config {
            jobs: 2,
            ..Config::default()
        };
        let cli = Cli::parse_from(["gitup", "--private", "-j", "0"]);
        let options = sync_options(&config, &cli);
        assert!(options.private);
        assert_eq!(options.jobs, 1);

        let cli = Cli::parse_from(["gitup"]);
        assert_eq!(sync_options(&config, &cli).jobs, 2);
    }
}
