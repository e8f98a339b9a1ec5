//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Discovers configuration and layers the CLI flags over it
//! - Dispatches to command handlers
//! - Handles all error output

use anyhow::{Context, Result};
use clap::Parser;
use cmds_config::{Config, ConfigSource};
use cmds_utils::{CmdsError, UserFriendlyError, logging::init_tracing};
use tracing::debug;

use super::args::{Cli, Commands};
use super::commands;
use crate::exit_codes::ExitCode;

/// Main CLI execution function.
///
/// Handles ALL output including errors. On failure returns the exit code
/// to use; main.rs only maps it to the process exit.
pub fn run() -> Result<(), ExitCode> {
    run_with(Cli::parse())
}

/// Run an already parsed command line.
pub fn run_with(cli: Cli) -> Result<(), ExitCode> {
    // A subscriber may already be installed when embedded; keep going.
    let _ = init_tracing(cli.verbose);

    let result = load_config(&cli).and_then(|config| dispatch(&cli, &config));
    match result {
        Ok(0) => Ok(()),
        Ok(status) => Err(ExitCode::from(status)),
        Err(err) => {
            report(&err);
            Err(ExitCode::from_error(&err))
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let base = match &cli.config {
        Some(path) => Config::load(path).map_err(CmdsError::from),
        None => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            Config::discover(&cwd).map_err(CmdsError::from)
        }
    }
    .context("Failed to load configuration")?;

    let mut builder = base.into_builder().source(ConfigSource::Cli);
    if cli.assert {
        builder = builder.assert(true);
    }
    if let Some(dir) = &cli.chdir {
        builder = builder.chdir(dir);
    }
    if let Some(mode) = cli.env_mode {
        builder = builder.env_mode(mode);
    }
    if let Some(format) = cli.format {
        builder = builder.format(format);
    }
    if let Some(mode) = cli.array_mode {
        builder = builder.tokenize_option("array_mode", mode.to_string());
    }
    if let Some(mode) = cli.hash_mode {
        builder = builder.tokenize_option("hash_mode", mode.to_string());
    }
    if let Some(mode) = cli.false_mode {
        builder = builder.tokenize_option("false_mode", mode.to_string());
    }
    if cli.dash_opt_names {
        builder = builder.tokenize_option("dash_opt_names", "true");
    }
    for pair in &cli.env {
        let (name, value) = pair.split_once('=').unwrap_or((pair.as_str(), ""));
        builder = builder.env(name, value);
    }

    let config = builder
        .build()
        .map_err(CmdsError::from)
        .context("Invalid command-line configuration")?;
    debug!(path = ?config.path, "configuration ready");
    Ok(config)
}

fn dispatch(cli: &Cli, config: &Config) -> Result<i32> {
    match &cli.command {
        Commands::Prepare { template } => commands::execute_prepare_command(template, config),
        Commands::Run { template, input } => commands::execute_run_command(template, input, config),
        Commands::Capture {
            template,
            input,
            json,
        } => commands::execute_capture_command(template, input, *json, config),
        Commands::Config { json } => commands::execute_config_command(*json, config),
    }
}

/// Print the error chain, with suggestions when the cause is one of ours.
fn report(err: &anyhow::Error) {
    eprintln!("Error: {err:#}");

    let suggestions = err
        .downcast_ref::<CmdsError>()
        .map(UserFriendlyError::suggestions)
        .unwrap_or_default();
    if !suggestions.is_empty() {
        eprintln!("\nSuggestions:");
        for suggestion in suggestions {
            eprintln!("  • {suggestion}");
        }
    }
}
