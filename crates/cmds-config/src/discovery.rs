use cmds_utils::ConfigError;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::model::Config;
use crate::sources::ConfigSource;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "CMDS_CONFIG";
/// Directory searched for upward from the working directory.
pub const CONFIG_DIR: &str = ".cmds";
pub const CONFIG_FILE: &str = "config.toml";

const REPO_MARKERS: [&str; 3] = [".git", ".hg", ".svn"];

impl Config {
    /// Parse configuration from TOML text.
    ///
    /// Values present in the text are attributed to
    /// [`ConfigSource::Programmatic`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFile`] for malformed TOML, unknown
    /// sections or keys, and values of the wrong type.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, None)
    }

    /// Load a configuration file.
    ///
    /// A relative `run.chdir` is resolved against the project directory: the
    /// parent of `.cmds/` when the file lives there, otherwise the file's own
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Unreadable`] if the file can't be read, and
    /// parse errors as for [`Config::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content, Some(path))?;

        if let Some(chdir) = &config.run.chdir
            && chdir.is_relative()
        {
            config.run.chdir = Some(project_dir(path).join(chdir));
        }

        debug!(path = %path.display(), keys = config.sources.len(), "loaded configuration");
        Ok(config)
    }

    /// Discover configuration for commands run from `start_dir`.
    ///
    /// Uses the file named by `CMDS_CONFIG` when set, otherwise the nearest
    /// `.cmds/config.toml` found searching upward, otherwise defaults.
    ///
    /// # Errors
    ///
    /// See [`Config::load`]. A missing file named by `CMDS_CONFIG` is an
    /// error; not finding one by searching is not.
    pub fn discover(start_dir: &Path) -> Result<Self, ConfigError> {
        let explicit = env::var_os(CONFIG_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self::discover_with(start_dir, explicit.as_deref())
    }

    /// Like [`Config::discover`], with the explicit path passed in instead of
    /// read from the environment.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn discover_with(start_dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::find_config_file(start_dir) {
            Some(path) => Self::load(&path),
            None => {
                debug!(start = %start_dir.display(), "no configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Search upward from `start_dir` for `.cmds/config.toml`, stopping at
    /// the filesystem root or a repository root.
    #[must_use]
    pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
        for dir in start_dir.ancestors() {
            let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
            if REPO_MARKERS.iter().any(|marker| dir.join(marker).exists()) {
                break;
            }
        }
        None
    }

    fn parse(content: &str, path: Option<&Path>) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidFile {
            path: path.map_or_else(|| PathBuf::from("<string>"), Path::to_path_buf),
            reason,
        };

        let table: toml::Table = content
            .parse()
            .map_err(|e: toml::de::Error| invalid(e.to_string()))?;
        let mut config: Self = toml::Value::Table(table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| invalid(e.to_string()))?;

        let source = path.map_or(ConfigSource::Programmatic, |p| {
            ConfigSource::File(p.to_path_buf())
        });
        for (section, value) in &table {
            if let toml::Value::Table(entries) = value {
                for key in entries.keys() {
                    config.record(format!("{section}.{key}"), source.clone());
                }
            }
        }
        config.path = path.map(Path::to_path_buf);
        Ok(config)
    }
}

fn project_dir(config_file: &Path) -> PathBuf {
    let dir = config_file.parent().unwrap_or_else(|| Path::new("."));
    if dir.file_name().is_some_and(|name| name == CONFIG_DIR) {
        dir.parent().unwrap_or(dir).to_path_buf()
    } else {
        dir.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmds_template::Format;
    use cmds_tokenize::ArrayMode;
    use tempfile::TempDir;

    fn write_config(root: &Path, content: &str) -> PathBuf {
        let dir = root.join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_from_toml_str_records_sources() {
        let config = Config::from_toml_str(
            r#"
            [tokenize]
            array_mode = "repeat"

            [run]
            format = "pretty"

            [env]
            PGHOST = "localhost"
            "#,
        )
        .unwrap();

        assert_eq!(config.tokenize.array_mode, ArrayMode::Repeat);
        assert_eq!(config.run.format, Format::Pretty);
        assert_eq!(config.env["PGHOST"], "localhost");
        assert_eq!(config.source_of("tokenize.array_mode"), ConfigSource::Programmatic);
        assert_eq!(config.source_of("env.PGHOST"), ConfigSource::Programmatic);
        assert_eq!(config.source_of("tokenize.hash_mode"), ConfigSource::Default);
        assert!(config.path.is_none());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        for content in ["[tokenise]\nx = 1\n", "[run]\nasert = true\n", "[tokenize]\narray_mode = \"zip\"\n"] {
            assert!(
                matches!(Config::from_toml_str(content), Err(ConfigError::InvalidFile { .. })),
                "accepted: {content}"
            );
        }
    }

    #[test]
    fn test_malformed_toml() {
        let err = Config::from_toml_str("[run\nassert = ").unwrap_err();
        assert!(err.to_string().contains("<string>"));
    }

    #[test]
    fn test_load_attributes_to_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "[run]\nassert = true\n");
        let config = Config::load(&path).unwrap();
        assert!(config.run.assert);
        assert_eq!(config.source_of("run.assert"), ConfigSource::File(path.clone()));
        assert_eq!(config.path, Some(path));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(&temp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }

    #[test]
    fn test_relative_chdir_resolves_against_project() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "[run]\nchdir = \"sub\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.run.chdir, Some(temp.path().join("sub")));
    }

    #[test]
    fn test_find_config_file_searches_upward() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "");
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(Config::find_config_file(&nested), Some(path));
    }

    #[test]
    fn test_find_config_file_stops_at_repo_root() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "");
        let repo = temp.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();
        let nested = repo.join("src");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(Config::find_config_file(&nested), None);
    }

    #[test]
    fn test_discover_with_explicit_path_wins() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[run]\nassert = true\n");
        let explicit = temp.path().join("other.toml");
        fs::write(&explicit, "[run]\nunset_env = true\n").unwrap();

        let config = Config::discover_with(temp.path(), Some(&explicit)).unwrap();
        assert!(config.run.unset_env);
        assert!(!config.run.assert);
    }

    #[test]
    fn test_discover_without_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        let config = Config::discover_with(temp.path(), None).unwrap();
        assert_eq!(config, Config::default());
    }
}
