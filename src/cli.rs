//! Command-line interface for janitor.
//!
//! This module handles:
//! - Argument parsing
//! - Logging setup
//! - Configuration resolution
//! - Running or simulating the organization and reporting the result

use crate::config::{Config, LoadedConfig};
use crate::file_organizer::{Organizer, RunContext};
use crate::output::OutputFormatter;
use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Printed by `--version`.
pub const VERSION_TEXT: &str = concat!("Janitor CLI - v", env!("CARGO_PKG_VERSION"));

/// Printed by `--info`.
pub const DEVELOPER_INFO: &str = concat!("Janitor CLI - Created by ", env!("CARGO_PKG_AUTHORS"));

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "janitor",
    about = "Tidy a directory by moving files into category folders",
    disable_version_flag = true
)]
pub struct Cli {
    /// Directory to organize (defaults to the current directory)
    pub directory: Option<PathBuf>,

    /// Print Janitor's version
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Print developer info
    #[arg(short = 'i', long = "info")]
    pub info: bool,

    /// Show what would be moved without moving anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Use this configuration file instead of the usual lookup
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log every skipped file and rejected config source
    #[arg(long)]
    pub verbose: bool,
}

/// What a single invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeCommand {
    /// Organize files in a directory.
    Organize {
        /// If true, only report what would be moved.
        dry_run: bool,
    },
    /// Print the version and exit.
    Version,
    /// Print developer info and exit.
    Info,
}

impl Cli {
    /// The command selected by the flags. `--version` wins over `--info`.
    pub fn command(&self) -> OrganizeCommand {
        if self.version {
            OrganizeCommand::Version
        } else if self.info {
            OrganizeCommand::Info
        } else {
            OrganizeCommand::Organize {
                dry_run: self.dry_run,
            }
        }
    }
}

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` takes precedence; otherwise janitor logs at `info`, or `debug`
/// with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "janitor=debug" } else { "janitor=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

/// Runs the parsed command line.
///
/// The target directory defaults to the current working directory.
pub fn run(cli: &Cli) -> Result<()> {
    let command = cli.command();
    let directory = match (&cli.directory, command) {
        (Some(dir), _) => dir.clone(),
        (None, OrganizeCommand::Organize { .. }) => {
            std::env::current_dir().context("Error getting current directory")?
        }
        (None, _) => PathBuf::new(),
    };
    run_cli_with_config(command, &directory, cli.config.as_deref())
}

/// Executes `command` against `dir_path`.
///
/// # Arguments
///
/// * `command` - What to do
/// * `dir_path` - The directory to organize
/// * `config_path` - Optional explicit configuration file; when absent the
///   usual lookup applies and never fails
///
/// # Errors
///
/// Fails if an explicit configuration cannot be loaded or the directory cannot
/// be read. Files that could not be moved are reported but do not fail the run.
pub fn run_cli_with_config(
    command: OrganizeCommand,
    dir_path: &Path,
    config_path: Option<&Path>,
) -> Result<()> {
    match command {
        OrganizeCommand::Version => {
            OutputFormatter::plain(VERSION_TEXT);
            Ok(())
        }
        OrganizeCommand::Info => {
            OutputFormatter::plain(DEVELOPER_INFO);
            Ok(())
        }
        OrganizeCommand::Organize { dry_run } => {
            let loaded = Config::resolve_with(config_path)
                .context("Error loading configuration")?;
            let organizer = build_organizer(dir_path, config_path, &loaded);
            if dry_run {
                organize_directory_dry_run(&organizer, &loaded)
            } else {
                organize_directory(&organizer, &loaded)
            }
        }
    }
}

fn build_organizer(dir_path: &Path, config_path: Option<&Path>, loaded: &LoadedConfig) -> Organizer {
    let mut context = RunContext::new(dir_path);
    if let Some(name) = config_path.and_then(Path::file_name) {
        context = context.with_config_name(name.to_string_lossy().into_owned());
    }
    let organizer = Organizer::new(&loaded.config, context);
    debug!(
        "{} extensions across {} categories",
        organizer.index().len(),
        organizer.index().categories().len()
    );
    organizer
}

/// Moves every matching file and prints a summary.
fn organize_directory(organizer: &Organizer, loaded: &LoadedConfig) -> Result<()> {
    let target = organizer.context().target_dir();
    OutputFormatter::info(&format!(
        "Janitor starting... (Target: {}, using {})",
        target.display(),
        loaded.source
    ));

    let progress = OutputFormatter::create_progress_bar(0);
    let result = organizer.run_with_progress(&progress);
    progress.finish_and_clear();
    let report = result.context("Error during organization")?;

    if report.moved.is_empty() {
        OutputFormatter::plain("Nothing to move.");
    } else {
        OutputFormatter::summary_table(&report.category_counts(), report.moved_count());
    }

    if report.has_failures() {
        OutputFormatter::header("FAILED");
        for failure in &report.failures {
            OutputFormatter::error(&format!("{}: {}", failure.name, failure.error));
        }
        OutputFormatter::warning(&format!(
            "{} file(s) could not be organized. Please review the errors above.",
            report.failures.len()
        ));
    } else {
        OutputFormatter::success("Janitor run complete. Directory is clean!");
    }

    Ok(())
}

/// Prints the moves a real run would make.
fn organize_directory_dry_run(organizer: &Organizer, loaded: &LoadedConfig) -> Result<()> {
    let target = organizer.context().target_dir();
    OutputFormatter::dry_run_notice(&format!(
        "Analyzing contents of: {} (using {})",
        target.display(),
        loaded.source
    ));

    let plan = organizer.plan().context("Error during organization")?;
    if plan.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(());
    }

    let mut category_counts: HashMap<String, usize> = HashMap::new();
    let mut conflicts = 0;
    for planned in &plan {
        if planned.conflict {
            conflicts += 1;
            OutputFormatter::warning(&format!(
                "{} → {}/ (already exists, would be skipped)",
                planned.name, planned.category
            ));
        } else {
            OutputFormatter::plain(&format!(" - {} → {}/", planned.name, planned.category));
            *category_counts.entry(planned.category.clone()).or_insert(0) += 1;
        }
    }

    OutputFormatter::summary_table(&category_counts, plan.len() - conflicts);
    OutputFormatter::dry_run_notice("No files were modified.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_arguments() {
        let cli = Cli::try_parse_from(["janitor"]).unwrap();
        assert_eq!(cli.directory, None);
        assert_eq!(cli.command(), OrganizeCommand::Organize { dry_run: false });
    }

    #[test]
    fn test_parse_directory_and_flags() {
        let cli =
            Cli::try_parse_from(["janitor", "--dry-run", "-c", "my.yml", "/tmp/downloads"])
                .unwrap();
        assert_eq!(cli.directory, Some(PathBuf::from("/tmp/downloads")));
        assert_eq!(cli.config, Some(PathBuf::from("my.yml")));
        assert_eq!(cli.command(), OrganizeCommand::Organize { dry_run: true });
    }

    #[test]
    fn test_version_and_info_flags() {
        let cli = Cli::try_parse_from(["janitor", "-v"]).unwrap();
        assert_eq!(cli.command(), OrganizeCommand::Version);

        let cli = Cli::try_parse_from(["janitor", "-i"]).unwrap();
        assert_eq!(cli.command(), OrganizeCommand::Info);

        let cli = Cli::try_parse_from(["janitor", "-i", "-v"]).unwrap();
        assert_eq!(cli.command(), OrganizeCommand::Version);
    }

    #[test]
    fn test_rejects_two_directories() {
        let result = Cli::try_parse_from(["janitor", "one", "two"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_version_text() {
        assert!(VERSION_TEXT.starts_with("Janitor CLI - v"));
        assert!(VERSION_TEXT.ends_with(env!("CARGO_PKG_VERSION")));
    }
}
