use cmds_template::Format;
use cmds_tokenize::TokenizeOptions;
use cmds_utils::ConfigError;
use std::path::PathBuf;

use crate::model::{Config, EnvMode};
use crate::sources::ConfigSource;

impl Config {
    /// Start a builder from built-in defaults.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Start a builder layered on top of this configuration.
    #[must_use]
    pub fn into_builder(self) -> ConfigBuilder {
        ConfigBuilder::from_base(self)
    }
}

/// Overrides applied on top of a base [`Config`].
///
/// Every value set here takes precedence over the base and is attributed to
/// the builder's source ([`ConfigSource::Programmatic`] unless changed with
/// [`ConfigBuilder::source`]).
///
/// ```rust
/// use cmds_config::{Config, ConfigSource, EnvMode};
///
/// let config = Config::builder()
///     .assert(true)
///     .env_mode(EnvMode::SpawnArg)
///     .tokenize_option("array_mode", "repeat")
///     .env("PGHOST", "localhost")
///     .build()?;
///
/// assert!(config.run.assert);
/// assert_eq!(config.source_of("run.assert"), ConfigSource::Programmatic);
/// # Ok::<(), cmds_utils::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    base: Config,
    source: Option<ConfigSource>,
    tokenize: Option<TokenizeOptions>,
    tokenize_overrides: Vec<(String, String)>,
    assert: Option<bool>,
    env_mode: Option<EnvMode>,
    format: Option<Format>,
    chdir: Option<PathBuf>,
    unset_env: Option<bool>,
    env: Vec<(String, String)>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_base(base: Config) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    /// Attribute overrides to `source`.
    #[must_use]
    pub fn source(mut self, source: ConfigSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Replace the tokenize options wholesale.
    #[must_use]
    pub fn tokenize(mut self, options: TokenizeOptions) -> Self {
        self.tokenize = Some(options);
        self
    }

    /// Override a single tokenize option from its string form.
    ///
    /// Checked in [`ConfigBuilder::build`].
    #[must_use]
    pub fn tokenize_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tokenize_overrides.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub const fn assert(mut self, assert: bool) -> Self {
        self.assert = Some(assert);
        self
    }

    #[must_use]
    pub const fn env_mode(mut self, mode: EnvMode) -> Self {
        self.env_mode = Some(mode);
        self
    }

    #[must_use]
    pub const fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    #[must_use]
    pub fn chdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chdir = Some(dir.into());
        self
    }

    #[must_use]
    pub const fn unset_env(mut self, unset: bool) -> Self {
        self.unset_env = Some(unset);
        self
    }

    /// Add or replace one environment variable.
    #[must_use]
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    /// Apply the overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unknown tokenize option
    /// or a value it can't parse, and for an empty environment variable name.
    pub fn build(self) -> Result<Config, ConfigError> {
        let source = self.source.unwrap_or(ConfigSource::Programmatic);
        let mut config = self.base;

        if let Some(tokenize) = self.tokenize {
            config.tokenize = tokenize;
            for key in TOKENIZE_KEYS {
                config.record(format!("tokenize.{key}"), source.clone());
            }
        }
        for (key, value) in self.tokenize_overrides {
            config
                .tokenize
                .set(&key, &value)
                .map_err(|_| ConfigError::InvalidValue {
                    key: format!("tokenize.{key}"),
                    value: value.clone(),
                })?;
            config.record(format!("tokenize.{key}"), source.clone());
        }

        if let Some(assert) = self.assert {
            config.run.assert = assert;
            config.record("run.assert", source.clone());
        }
        if let Some(mode) = self.env_mode {
            config.run.env_mode = mode;
            config.record("run.env_mode", source.clone());
        }
        if let Some(format) = self.format {
            config.run.format = format;
            config.record("run.format", source.clone());
        }
        if let Some(dir) = self.chdir {
            config.run.chdir = Some(dir);
            config.record("run.chdir", source.clone());
        }
        if let Some(unset) = self.unset_env {
            config.run.unset_env = unset;
            config.record("run.unset_env", source.clone());
        }

        for (name, value) in self.env {
            if name.is_empty() || name.contains('=') {
                return Err(ConfigError::InvalidValue {
                    key: "env".to_string(),
                    value: format!("{name}={value}"),
                });
            }
            config.record(format!("env.{name}"), source.clone());
            config.env.insert(name, value);
        }

        Ok(config)
    }
}

const TOKENIZE_KEYS: [&str; 10] = [
    "array_mode",
    "array_join_string",
    "dash_opt_names",
    "false_mode",
    "false_short_opt_mode",
    "flatten_array_values",
    "hash_mode",
    "hash_join_string",
    "long_opt_separator",
    "short_opt_separator",
];
