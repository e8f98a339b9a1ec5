//! cmds - render shell command templates safely and run them
//!
//! Values substituted into a command template become correctly escaped shell
//! words, so a file name with spaces, a map of options or a list of values
//! reaches the child exactly as meant. The prepared command runs through the
//! shell with its standard streams handled on worker threads.
//!
//! cmds can be used in two ways:
//! - **CLI**: `cmds prepare`, `cmds run`, `cmds capture`
//! - **Library**: build a [`Cmd`] and prepare, stream or capture it
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use cmds::{Cmd, Kwds, Value};
//!
//! let ls = Cmd::new("ls %{opts} %s").kwd("opts", Value::map([("l", true)]));
//! let result = ls.capture(&[Value::from("my dir")], &Kwds::new(), None)?;
//! println!("{}", result.out);
//! # Ok::<(), cmds::CmdsError>(())
//! ```
//!
//! # Workspace
//!
//! - [`cmds_tokenize`]: escaping and tokenization of values and options
//! - [`cmds_template`]: templates and `%s` shortcuts
//! - [`cmds_runner`]: spawning with piped, threaded I/O
//! - [`cmds_config`]: configuration files and overrides
//! - [`cmds_utils`]: errors, logging and text helpers

pub mod cli;
pub mod cmd;
pub mod exit_codes;

pub use cmd::{Cmd, Kwds};
pub use exit_codes::ExitCode;

pub use cmds_config::{Config, ConfigBuilder, ConfigSource, EnvMode};
pub use cmds_runner::{CmdResult, Input, IoBlock, IoHandler, Sink, SpawnOptions, Spawner};
pub use cmds_template::{Format, Template};
pub use cmds_tokenize::{TokenizeOptions, Value, escape, quote, tokenize};
pub use cmds_utils::{CmdsError, ErrorCategory, SpawnError, TemplateError, TokenizeError};
