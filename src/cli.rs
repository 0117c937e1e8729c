//! Command-line interface module for dirsweep.
//!
//! This module handles:
//! - Argument parsing
//! - Configuration loading and validation
//! - Running the poll loop, a single cycle, or a configuration check

use crate::collaborators::Collaborators;
use crate::config::{Config, ConfigError, ValidatedConfig};
use crate::logging::{self, LoggingError};
use crate::orchestrator::{Orchestrator, OrchestratorError};
use crate::output::OutputFormatter;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(
    name = "dirsweep",
    version,
    about = "Move files off newly mounted directories and purge them after a while"
)]
pub struct Cli {
    /// Configuration file (JSON, or TOML with a .toml extension)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The selected subcommand, `run` when none is given.
    pub fn subcommand(&self) -> Command {
        self.command.unwrap_or_default()
    }
}

#[derive(Subcommand, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Command {
    /// Poll the source directory until interrupted (default)
    #[default]
    Run,
    /// Run a single cycle and print what it did
    Once,
    /// Validate the configuration and print the resolved settings
    Check,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

/// Loads the configuration from `config_path` (or the default locations) and
/// validates it.
pub fn load_config(config_path: Option<&Path>) -> Result<ValidatedConfig, ConfigError> {
    Config::load(config_path)?.validate()
}

/// Runs the CLI application.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dirsweep::cli::{Cli, run_cli};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     if let Err(e) = run_cli(Cli::parse()).await {
///         eprintln!("Error: {}", e);
///     }
/// }
/// ```
pub async fn run_cli(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.subcommand() {
        Command::Check => {
            OutputFormatter::settings(&config);
            OutputFormatter::success("Configuration is valid");
            Ok(())
        }
        Command::Once => {
            let _guard = logging::init_logging(config.verbose(), config.log_dir())?;
            let mut orchestrator = Orchestrator::new(&config, Collaborators::default());
            let summary = orchestrator.run_cycle()?;
            OutputFormatter::cycle_summary(&summary);
            Ok(())
        }
        Command::Run => {
            let _guard = logging::init_logging(config.verbose(), config.log_dir())?;
            let mut orchestrator = Orchestrator::new(&config, Collaborators::default());
            orchestrator.run(shutdown_signal()).await?;
            Ok(())
        }
    }
}

/// Completes on Ctrl+C. If the signal handler cannot be installed the loop
/// runs until killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_is_default_command() {
        let cli = Cli::try_parse_from(["dirsweep"]).unwrap();
        assert_eq!(cli.subcommand(), Command::Run);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_config_and_subcommand() {
        let cli = Cli::try_parse_from(["dirsweep", "--config", "/etc/dirsweep.toml", "once"])
            .unwrap();
        assert_eq!(cli.subcommand(), Command::Once);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/dirsweep.toml")));

        let cli = Cli::try_parse_from(["dirsweep", "check", "-c", "conf.json"]).unwrap();
        assert_eq!(cli.subcommand(), Command::Check);
        assert_eq!(cli.config, Some(PathBuf::from("conf.json")));
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["dirsweep", "sweep"]).is_err());
    }

    #[tokio::test]
    async fn test_check_reports_invalid_config() {
        let temp = tempfile::TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().join("dirsweep.json");
        let content = format!(
            r#"{{
                "source_dir": "{}",
                "target_dir": "{}",
                "pattern": "IMG.*",
                "other_pattern": [],
                "excluded_dirs": [],
                "delay": 5,
                "verbose": false,
                "purge_after": 3
            }}"#,
            temp.path().display(),
            temp.path().display()
        );
        std::fs::write(&path, content).unwrap();

        let cli = Cli {
            config: Some(path),
            command: Some(Command::Check),
        };
        let result = run_cli(cli).await;
        assert!(matches!(
            result,
            Err(CliError::Config(ConfigError::PatternMalformed { .. }))
        ));
    }
}
