use cmds_template::Format;
use cmds_tokenize::TokenizeOptions;
use cmds_utils::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::sources::ConfigSource;

/// How a command's environment reaches the child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvMode {
    /// Prefix the command with `NAME=value` assignments (default).
    #[default]
    Inline,
    /// Hand the variables to the spawner.
    SpawnArg,
}

impl fmt::Display for EnvMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => write!(f, "inline"),
            Self::SpawnArg => write!(f, "spawn_arg"),
        }
    }
}

impl FromStr for EnvMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inline" => Ok(Self::Inline),
            "spawn_arg" | "spawn-arg" => Ok(Self::SpawnArg),
            other => Err(ConfigError::InvalidValue {
                key: "run.env_mode".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// The `[run]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Fail on non-zero exit status.
    pub assert: bool,
    pub env_mode: EnvMode,
    pub format: Format,
    /// Working directory for spawned commands.
    pub chdir: Option<PathBuf>,
    /// Start children from an empty environment.
    pub unset_env: bool,
}

/// Configuration for cmds.
///
/// Built from defaults, a TOML file and overrides, in that order of
/// precedence. Each value that did not come from the defaults records where
/// it came from, see [`Config::source_of`].
///
/// # Example
///
/// ```rust
/// use cmds_config::{Config, EnvMode};
///
/// let config = Config::from_toml_str(
///     r#"
///     [tokenize]
///     array_mode = "repeat"
///
///     [run]
///     env_mode = "spawn_arg"
///     "#,
/// )?;
/// assert_eq!(config.run.env_mode, EnvMode::SpawnArg);
/// assert!(!config.run.assert);
/// # Ok::<(), cmds_utils::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub tokenize: TokenizeOptions,
    pub run: RunConfig,
    /// Extra variables for every command.
    pub env: BTreeMap<String, String>,

    /// File the configuration was loaded from, if any.
    #[serde(skip)]
    pub path: Option<PathBuf>,

    /// Source of every non-default value, keyed `section.key`.
    #[serde(skip)]
    pub(crate) sources: BTreeMap<String, ConfigSource>,
}

impl Config {
    /// Where the value for `key` (`section.key`) came from.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.sources.get(key).cloned().unwrap_or_default()
    }

    pub(crate) fn record(&mut self, key: impl Into<String>, source: ConfigSource) {
        self.sources.insert(key.into(), source);
    }
}
