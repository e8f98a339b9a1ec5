//! Configuration for cmds.
//!
//! A [`Config`] gathers the defaults every command is rendered and run with:
//! tokenize options, run settings and extra environment. Values come, in
//! increasing precedence, from built-in defaults, a `config.toml` file and
//! programmatic or command-line overrides applied through [`ConfigBuilder`].
//!
//! ```toml
//! [tokenize]
//! array_mode = "repeat"
//! dash_opt_names = true
//!
//! [run]
//! assert = true
//! env_mode = "spawn_arg"
//! format = "pretty"
//!
//! [env]
//! PGHOST = "localhost"
//! ```

pub mod builder;
pub mod discovery;
pub mod model;
pub mod sources;

pub use builder::ConfigBuilder;
pub use discovery::{CONFIG_DIR, CONFIG_ENV, CONFIG_FILE};
pub use model::{Config, EnvMode, RunConfig};
pub use sources::ConfigSource;
