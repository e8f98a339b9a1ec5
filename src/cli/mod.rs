//! Command-line interface for cmds
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions and parsing structures (clap)
//! - `run`: Main entry point and command dispatch
//! - `commands`: Command implementations and helpers

pub mod args;
mod commands;
mod run;

pub use args::{Cli, Commands, InputArgs, TemplateArgs, build_cli};
pub use commands::{parse_kwds, parse_value};
pub use run::{run, run_with};
