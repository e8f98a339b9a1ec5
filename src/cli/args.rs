//! CLI argument definitions and parsing structures
//!
//! Defines the `Cli` struct, the global flags shared by every subcommand and
//! the subcommand enum.

use clap::{Args, Parser, Subcommand};
use cmds_config::EnvMode;
use cmds_template::Format;
use cmds_tokenize::{ArrayMode, FalseMode, HashMode};
use std::path::PathBuf;

/// cmds - render shell command templates safely and run them
#[derive(Parser, Debug)]
#[command(name = "cmds")]
#[command(about = "Render shell command templates with escaped values and run them")]
#[command(long_about = r#"
cmds renders command templates, substituting values as correctly escaped shell
words, and runs the result through the shell.

EXAMPLES:
  # Print the prepared command
  cmds prepare 'psql %{opts} %s' blah -k 'opts={"host":"localhost","port":5432}'

  # Run it, streaming output
  cmds run 'wc -l' --input $'one\ntwo\n'

  # Capture the result as JSON
  cmds capture --json 'ls %s' 'my dir'

TEMPLATES:
  %s            next positional value
  %{key}        keyword value (%{key?} when optional)
  <%= expr %>   tokenized values; <% if x? %>...<% end %>, <% for k, v in m %>

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is CMDS_CONFIG, or found by searching upward for .cmds/config.toml
  Use --config to specify an explicit config file path
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output (spawn lifecycle on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Fail when the command exits non-zero
    #[arg(long, global = true)]
    pub assert: bool,

    /// Working directory for the command
    #[arg(long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Extra environment variable (repeatable)
    #[arg(short = 'e', long = "env", value_name = "NAME=VALUE", global = true)]
    pub env: Vec<String>,

    /// How environment variables are passed: inline or spawn_arg
    #[arg(long, global = true)]
    pub env_mode: Option<EnvMode>,

    /// Output format of the prepared command: squish, pretty or raw
    #[arg(long, global = true)]
    pub format: Option<Format>,

    /// Array values: join, repeat or json
    #[arg(long, global = true)]
    pub array_mode: Option<ArrayMode>,

    /// Map values: join or json
    #[arg(long, global = true)]
    pub hash_mode: Option<HashMode>,

    /// False options: omit or negate
    #[arg(long, global = true)]
    pub false_mode: Option<FalseMode>,

    /// Turn `_` into `-` in option names
    #[arg(long, global = true)]
    pub dash_opt_names: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// A template and the values substituted into it.
#[derive(Args, Debug, Clone)]
pub struct TemplateArgs {
    /// Command template
    pub template: String,

    /// Positional values; text that parses as JSON is used as a structured value
    pub args: Vec<String>,

    /// Keyword value (repeatable); the value is parsed like positional values
    #[arg(short = 'k', long = "kwd", value_name = "KEY=VALUE")]
    pub kwds: Vec<String>,
}

/// Where the command's stdin comes from.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Text fed to the command's stdin
    #[arg(long, conflicts_with = "stdin")]
    pub input: Option<String>,

    /// Pass this process's stdin through to the command
    #[arg(long)]
    pub stdin: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the prepared command without running it
    ///
    /// EXAMPLES:
    ///   cmds prepare 'cp %s %s' 'my file.txt' backup/
    ///   cmds --format pretty prepare "$(cat deploy.tpl)" -k env=prod
    Prepare {
        #[command(flatten)]
        template: TemplateArgs,
    },

    /// Run the command with output streamed to the terminal
    ///
    /// Exits with the command's status.
    Run {
        #[command(flatten)]
        template: TemplateArgs,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Run the command and print its captured stdout
    ///
    /// Captured stderr is forwarded to stderr. Exits with the command's
    /// status unless --json is given.
    Capture {
        #[command(flatten)]
        template: TemplateArgs,

        #[command(flatten)]
        input: InputArgs,

        /// Print the full result (cmd, status, out, err) as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration and where each value came from
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Build the clap command, for completions and docs.
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
