use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::model::Config;

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    File(PathBuf),
    Programmatic,
    Cli,
}

impl ConfigSource {
    /// Stable short label for display.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::File(_) => "config",
            Self::Programmatic => "programmatic",
            Self::Cli => "cli",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "config ({})", path.display()),
            other => f.write_str(other.label()),
        }
    }
}

impl Config {
    /// Every setting as `section.key` → (value, source).
    ///
    /// Unset optional values are left out.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, ConfigSource)> {
        let mut config = BTreeMap::new();
        let mut add = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                config.insert(key.to_string(), (value, self.source_of(key)));
            }
        };

        let tokenize = &self.tokenize;
        add("tokenize.array_mode", Some(tokenize.array_mode.to_string()));
        add("tokenize.array_join_string", Some(tokenize.array_join_string.clone()));
        add("tokenize.dash_opt_names", Some(tokenize.dash_opt_names.to_string()));
        add("tokenize.false_mode", Some(tokenize.false_mode.to_string()));
        add(
            "tokenize.false_short_opt_mode",
            tokenize.false_short_opt_mode.clone().map(String::from),
        );
        add(
            "tokenize.flatten_array_values",
            Some(tokenize.flatten_array_values.to_string()),
        );
        add("tokenize.hash_mode", Some(tokenize.hash_mode.to_string()));
        add("tokenize.hash_join_string", Some(tokenize.hash_join_string.clone()));
        add("tokenize.long_opt_separator", Some(tokenize.long_opt_separator.clone()));
        add("tokenize.short_opt_separator", Some(tokenize.short_opt_separator.clone()));

        add("run.assert", Some(self.run.assert.to_string()));
        add("run.env_mode", Some(self.run.env_mode.to_string()));
        add("run.format", Some(self.run.format.to_string()));
        add("run.chdir", self.run.chdir.as_ref().map(|p| p.display().to_string()));
        add("run.unset_env", Some(self.run.unset_env.to_string()));

        for (name, value) in &self.env {
            add(&format!("env.{name}"), Some(value.clone()));
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(ConfigSource::Default.to_string(), "default");
        assert_eq!(ConfigSource::Cli.to_string(), "cli");
        assert_eq!(
            ConfigSource::File(PathBuf::from("/x/config.toml")).to_string(),
            "config (/x/config.toml)"
        );
        assert_eq!(ConfigSource::File(PathBuf::new()).label(), "config");
    }

    #[test]
    fn test_effective_config_of_defaults() {
        let effective = Config::default().effective_config();
        assert_eq!(
            effective["tokenize.array_mode"],
            ("join".to_string(), ConfigSource::Default)
        );
        assert_eq!(
            effective["run.format"],
            ("squish".to_string(), ConfigSource::Default)
        );
        assert!(!effective.contains_key("run.chdir"));
        assert!(!effective.contains_key("tokenize.false_short_opt_mode"));
    }
}
