//! The tokenize configuration record.

use cmds_utils::TokenizeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How array values become tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayMode {
    /// One token: the values joined by `array_join_string`.
    #[default]
    Join,
    /// One token (or option) per value.
    Repeat,
    /// One single-quoted JSON token.
    Json,
}

/// How map values become tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashMode {
    /// `key<hash_join_string>value` strings, then handled like an array.
    #[default]
    Join,
    /// One single-quoted JSON token.
    Json,
}

/// What a `false` option value emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FalseMode {
    /// Nothing.
    #[default]
    #[serde(alias = "ignore")]
    Omit,
    /// `--no-name` for long names; short names need a [`FalseShortOptMode`].
    #[serde(alias = "no")]
    Negate,
}

/// How a single-character option is negated under [`FalseMode::Negate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FalseShortOptMode {
    /// `-x` becomes `-X`. Only names in `a-z`.
    Capitalize,
    /// `-x` becomes `--no-x`.
    Long,
    /// `-x false`.
    String,
    /// `-x <custom>`, escaped.
    Custom(String),
}

impl From<String> for FalseShortOptMode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "capitalize" | "cap" | "upper" | "upcase" => Self::Capitalize,
            "long" => Self::Long,
            "string" => Self::String,
            _ => Self::Custom(s),
        }
    }
}

impl From<FalseShortOptMode> for String {
    fn from(mode: FalseShortOptMode) -> Self {
        match mode {
            FalseShortOptMode::Capitalize => "capitalize".to_string(),
            FalseShortOptMode::Long => "long".to_string(),
            FalseShortOptMode::String => "string".to_string(),
            FalseShortOptMode::Custom(s) => s,
        }
    }
}

impl FromStr for ArrayMode {
    type Err = TokenizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "join" => Ok(Self::Join),
            "repeat" => Ok(Self::Repeat),
            "json" => Ok(Self::Json),
            other => Err(TokenizeError::bad_option("array_mode", other, "join, repeat or json")),
        }
    }
}

impl FromStr for HashMode {
    type Err = TokenizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "join" => Ok(Self::Join),
            "json" => Ok(Self::Json),
            other => Err(TokenizeError::bad_option("hash_mode", other, "join or json")),
        }
    }
}

impl FromStr for FalseMode {
    type Err = TokenizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "omit" | "ignore" => Ok(Self::Omit),
            "negate" | "no" => Ok(Self::Negate),
            other => Err(TokenizeError::bad_option("false_mode", other, "omit or negate")),
        }
    }
}

impl fmt::Display for ArrayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Join => write!(f, "join"),
            Self::Repeat => write!(f, "repeat"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl fmt::Display for HashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Join => write!(f, "join"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl fmt::Display for FalseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Omit => write!(f, "omit"),
            Self::Negate => write!(f, "negate"),
        }
    }
}

/// Options controlling how values and option maps are tokenized.
///
/// Every field has a default, so call sites override only what they need:
///
/// ```rust
/// use cmds_tokenize::{ArrayMode, TokenizeOptions};
///
/// let opts = TokenizeOptions::default().array_mode(ArrayMode::Repeat);
/// assert_eq!(opts.array_join_string, ",");
/// ```
///
/// Deserializing accepts any subset of keys (`#[serde(default)]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenizeOptions {
    pub array_mode: ArrayMode,
    pub array_join_string: String,
    /// Turn `_` into `-` in option names.
    pub dash_opt_names: bool,
    pub false_mode: FalseMode,
    pub false_short_opt_mode: Option<FalseShortOptMode>,
    /// Flatten nested arrays before applying `array_mode`.
    pub flatten_array_values: bool,
    pub hash_mode: HashMode,
    pub hash_join_string: String,
    /// Between `--name` and its value.
    pub long_opt_separator: String,
    /// Between `-x` and its value.
    pub short_opt_separator: String,
}

impl Default for TokenizeOptions {
    fn default() -> Self {
        Self {
            array_mode: ArrayMode::Join,
            array_join_string: ",".to_string(),
            dash_opt_names: false,
            false_mode: FalseMode::Omit,
            false_short_opt_mode: None,
            flatten_array_values: true,
            hash_mode: HashMode::Join,
            hash_join_string: ":".to_string(),
            long_opt_separator: "=".to_string(),
            short_opt_separator: " ".to_string(),
        }
    }
}

impl TokenizeOptions {
    #[must_use]
    pub const fn array_mode(mut self, mode: ArrayMode) -> Self {
        self.array_mode = mode;
        self
    }

    #[must_use]
    pub fn array_join_string(mut self, s: impl Into<String>) -> Self {
        self.array_join_string = s.into();
        self
    }

    #[must_use]
    pub const fn dash_opt_names(mut self, enabled: bool) -> Self {
        self.dash_opt_names = enabled;
        self
    }

    #[must_use]
    pub const fn false_mode(mut self, mode: FalseMode) -> Self {
        self.false_mode = mode;
        self
    }

    #[must_use]
    pub fn false_short_opt_mode(mut self, mode: FalseShortOptMode) -> Self {
        self.false_short_opt_mode = Some(mode);
        self
    }

    #[must_use]
    pub const fn flatten_array_values(mut self, enabled: bool) -> Self {
        self.flatten_array_values = enabled;
        self
    }

    #[must_use]
    pub const fn hash_mode(mut self, mode: HashMode) -> Self {
        self.hash_mode = mode;
        self
    }

    #[must_use]
    pub fn hash_join_string(mut self, s: impl Into<String>) -> Self {
        self.hash_join_string = s.into();
        self
    }

    #[must_use]
    pub fn long_opt_separator(mut self, s: impl Into<String>) -> Self {
        self.long_opt_separator = s.into();
        self
    }

    #[must_use]
    pub fn short_opt_separator(mut self, s: impl Into<String>) -> Self {
        self.short_opt_separator = s.into();
        self
    }

    /// Override one option by name from its string form, as given on a
    /// command line (`array_mode=repeat`).
    ///
    /// # Errors
    ///
    /// Returns [`TokenizeError::BadOption`] for unknown keys or values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), TokenizeError> {
        match key {
            "array_mode" => self.array_mode = value.parse()?,
            "array_join_string" => self.array_join_string = value.to_string(),
            "dash_opt_names" => self.dash_opt_names = parse_bool(key, value)?,
            "false_mode" => self.false_mode = value.parse()?,
            "false_short_opt_mode" => {
                self.false_short_opt_mode = Some(FalseShortOptMode::from(value.to_string()));
            }
            "flatten_array_values" => self.flatten_array_values = parse_bool(key, value)?,
            "hash_mode" => self.hash_mode = value.parse()?,
            "hash_join_string" => self.hash_join_string = value.to_string(),
            "long_opt_separator" => self.long_opt_separator = value.to_string(),
            "short_opt_separator" => self.short_opt_separator = value.to_string(),
            other => {
                return Err(TokenizeError::bad_option(
                    "key",
                    other,
                    "a TokenizeOptions field name",
                ));
            }
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, TokenizeError> {
    match value {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(TokenizeError::bad_option(key, other, "true or false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = TokenizeOptions::default();
        assert_eq!(opts.array_mode, ArrayMode::Join);
        assert_eq!(opts.array_join_string, ",");
        assert!(!opts.dash_opt_names);
        assert_eq!(opts.false_mode, FalseMode::Omit);
        assert!(opts.false_short_opt_mode.is_none());
        assert!(opts.flatten_array_values);
        assert_eq!(opts.hash_mode, HashMode::Join);
        assert_eq!(opts.hash_join_string, ":");
        assert_eq!(opts.long_opt_separator, "=");
        assert_eq!(opts.short_opt_separator, " ");
    }

    #[test]
    fn test_bad_mode_strings_are_errors() {
        assert!(matches!(
            "multiple".parse::<ArrayMode>(),
            Err(TokenizeError::BadOption { key, .. }) if key == "array_mode"
        ));
        assert!("yaml".parse::<HashMode>().is_err());
        assert!("maybe".parse::<FalseMode>().is_err());
    }

    #[test]
    fn test_false_mode_aliases() {
        assert_eq!("ignore".parse::<FalseMode>().unwrap(), FalseMode::Omit);
        assert_eq!("no".parse::<FalseMode>().unwrap(), FalseMode::Negate);
    }

    #[test]
    fn test_false_short_opt_mode_from_string() {
        assert_eq!(
            FalseShortOptMode::from("upcase".to_string()),
            FalseShortOptMode::Capitalize
        );
        assert_eq!(
            FalseShortOptMode::from("off".to_string()),
            FalseShortOptMode::Custom("off".to_string())
        );
    }

    #[test]
    fn test_set_by_name() {
        let mut opts = TokenizeOptions::default();
        opts.set("array_mode", "repeat").unwrap();
        opts.set("dash_opt_names", "true").unwrap();
        assert_eq!(opts.array_mode, ArrayMode::Repeat);
        assert!(opts.dash_opt_names);
        assert!(opts.set("array_mode", "sideways").is_err());
        assert!(opts.set("nonsense", "1").is_err());
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let opts: TokenizeOptions =
            serde_json::from_str(r#"{"array_mode": "repeat", "false_mode": "no"}"#).unwrap();
        assert_eq!(opts.array_mode, ArrayMode::Repeat);
        assert_eq!(opts.false_mode, FalseMode::Negate);
        assert_eq!(opts.long_opt_separator, "=");
    }

    #[test]
    fn test_unknown_mode_fails_deserialize() {
        let result: Result<TokenizeOptions, _> =
            serde_json::from_str(r#"{"array_mode": "multiple"}"#);
        assert!(result.is_err());
    }
}
