use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Library-level error type for cmds.
///
/// `CmdsError` wraps the per-subsystem errors so that callers chaining
/// rendering, tokenization and execution can use a single `?`.
///
/// # Error Categories
///
/// | Category | Source |
/// |----------|--------|
/// | `Configuration` | bad tokenize modes, empty option names, conflicting input, config files |
/// | `Substitution` | missing keyword or positional values while rendering a template |
/// | `Execution` | spawn failures, worker thread panics, pipe I/O |
/// | `ProcessFailure` | non-zero exit status under assertion |
///
/// # Exit Code Mapping
///
/// | Exit Code | Meaning |
/// |-----------|---------|
/// | 2 | Configuration errors |
/// | 3 | Substitution errors |
/// | 70 | Execution errors |
/// | child status | Process failure under assertion |
#[derive(Error, Debug)]
pub enum CmdsError {
    #[error("Tokenize error: {0}")]
    Tokenize(#[from] TokenizeError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Spawn error: {0}")]
    Spawn(#[from] SpawnError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Trait for providing user-friendly error reporting with suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Substitution,
    Execution,
    ProcessFailure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Substitution => write!(f, "Substitution"),
            Self::Execution => write!(f, "Execution"),
            Self::ProcessFailure => write!(f, "Process Failure"),
        }
    }
}

/// Errors raised while turning values into shell tokens.
///
/// All of these are configuration errors: they fail fast, before any process
/// is spawned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("Bad `{key}` option: {value:?}, should be {expected}")]
    BadOption {
        key: String,
        value: String,
        expected: String,
    },

    #[error("Option name must be a string of length greater than zero")]
    EmptyOptionName,

    #[error(
        "Can't negate short option '{name}': `false_mode` is negate but no `false_short_opt_mode` is set"
    )]
    ShortNegationUnset { name: String },

    #[error("Can't negate CLI option '{name}' by capitalizing, only names in [a-z] are supported")]
    CapitalizeNegation { name: String },
}

impl TokenizeError {
    /// Shorthand for [`TokenizeError::BadOption`].
    #[must_use]
    pub fn bad_option(key: &str, value: impl Into<String>, expected: &str) -> Self {
        Self::BadOption {
            key: key.to_string(),
            value: value.into(),
            expected: expected.to_string(),
        }
    }
}

impl UserFriendlyError for TokenizeError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::BadOption { expected, .. } => vec![format!("Use one of: {expected}")],
            Self::EmptyOptionName => vec!["Remove the empty key from the option map".to_string()],
            Self::ShortNegationUnset { .. } => vec![
                "Set `false_short_opt_mode` to capitalize, long, string or a custom string"
                    .to_string(),
                "Use `false_mode = \"omit\"` to drop false options".to_string(),
            ],
            Self::CapitalizeNegation { .. } => vec![
                "Use `false_short_opt_mode = \"long\"` for this option".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors raised by the template layer while rendering a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Couldn't find key {key:?} in keywords {available:?}")]
    MissingKey { key: String, available: Vec<String> },

    #[error("Missing positional argument at index {index} ({count} provided)")]
    MissingArg { index: usize, count: usize },

    #[error("Unclosed tag starting at byte {offset}")]
    UnclosedTag { offset: usize },

    #[error("Unexpected `{tag}` at byte {offset}")]
    UnexpectedTag { tag: String, offset: usize },

    #[error("Unterminated `{opened}` block")]
    UnterminatedBlock { opened: String },

    #[error("Bad expression {expr:?}: {reason}")]
    BadExpression { expr: String, reason: String },

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
}

impl UserFriendlyError for TemplateError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingKey { key, .. } => vec![
                format!("Pass a value for `{key}`"),
                format!("Use `{key}?` to make the substitution optional"),
            ],
            Self::MissingArg { .. } => {
                vec!["Pass one positional value per `%s` / `arg` in the template".to_string()]
            }
            Self::UnclosedTag { .. } | Self::UnexpectedTag { .. } | Self::UnterminatedBlock { .. } => {
                vec!["Check that every `<%` has a matching `%>` and every block an `end`".to_string()]
            }
            Self::BadExpression { .. } => vec![
                "Expressions may be `arg`, `args[N]`, `name`, `name?`, a number, true, false, nil or a quoted string"
                    .to_string(),
            ],
            Self::Tokenize(err) => err.suggestions(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingKey { .. } | Self::MissingArg { .. } => ErrorCategory::Substitution,
            _ => ErrorCategory::Configuration,
        }
    }
}

/// Process spawn and I/O multiplexing errors
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("Input supplied both as an argument and by the io block")]
    ConflictingInput,

    #[error("This handler has already been started")]
    HandlerAlreadyStarted,

    #[error("Failed to spawn `{cmd}`: {source}")]
    SpawnFailed {
        cmd: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create {name} pipe: {source}")]
    PipeFailed {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("{name} thread panicked")]
    WorkerPanicked { name: String },

    #[error("{name} I/O failed: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("{}", non_zero_message(.cmd, .status, .stderr))]
    NonZeroExit {
        cmd: String,
        status: i32,
        stderr: Option<String>,
    },
}

fn non_zero_message(cmd: &str, status: &i32, stderr: &Option<String>) -> String {
    let mut msg = format!("command `{cmd}` exited with status {status}");
    if let Some(err) = stderr {
        msg.push_str(" and stderr:\n\n");
        msg.push_str(err);
    }
    msg
}

impl SpawnError {
    /// Return an error unless `status` is zero.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError::NonZeroExit`] carrying the command, status and
    /// stderr text (when known).
    pub fn check_status(cmd: &str, status: i32, stderr: Option<&str>) -> Result<(), Self> {
        if status == 0 {
            return Ok(());
        }
        Err(Self::NonZeroExit {
            cmd: cmd.to_string(),
            status,
            stderr: stderr.map(str::to_string),
        })
    }

    /// Exit status of the failed command, if this is a process failure.
    #[must_use]
    pub const fn status(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl UserFriendlyError for SpawnError {
    fn user_message(&self) -> String {
        match self {
            Self::NonZeroExit { cmd, status, .. } => {
                format!("Command `{cmd}` failed with exit status {status}")
            }
            other => other.to_string(),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ConflictingInput => vec![
                "Supply input either through the `input` argument or the io block, not both"
                    .to_string(),
            ],
            Self::SpawnFailed { .. } => vec![
                "Check that the shell exists and the working directory is valid".to_string(),
            ],
            Self::NonZeroExit { .. } => vec![
                "Run with --verbose to see the spawn lifecycle".to_string(),
                "Drop --assert to inspect the status without failing".to_string(),
            ],
            _ => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::ConflictingInput | Self::HandlerAlreadyStarted => ErrorCategory::Configuration,
            Self::NonZeroExit { .. } => ErrorCategory::ProcessFailure,
            _ => ErrorCategory::Execution,
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration file {path}: {reason}")]
    InvalidFile { path: PathBuf, reason: String },

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Unreadable { .. } => vec![
                "Check the path passed with --config or in CMDS_CONFIG".to_string(),
            ],
            Self::InvalidFile { .. } => vec![
                "Sections are [tokenize], [run] and [env]".to_string(),
            ],
            Self::InvalidValue { .. } => vec![
                "Remove the value to fall back to the default".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

impl UserFriendlyError for CmdsError {
    fn user_message(&self) -> String {
        match self {
            Self::Tokenize(err) => err.user_message(),
            Self::Template(err) => err.user_message(),
            Self::Spawn(err) => err.user_message(),
            Self::Config(err) => err.user_message(),
            Self::Io(err) => format!("I/O failure: {err}"),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Tokenize(err) => err.suggestions(),
            Self::Template(err) => err.suggestions(),
            Self::Spawn(err) => err.suggestions(),
            Self::Config(err) => err.suggestions(),
            Self::Io(_) => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Tokenize(err) => err.category(),
            Self::Template(err) => err.category(),
            Self::Spawn(err) => err.category(),
            Self::Config(err) => err.category(),
            Self::Io(_) => ErrorCategory::Execution,
        }
    }
}

impl CmdsError {
    /// Get a user-friendly error message with actionable suggestions.
    ///
    /// ```text
    /// Error: <user message>
    ///
    /// Suggestions:
    ///   • <suggestion 1>
    /// ```
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = format!("Error: {}\n", self.user_message());

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }

    /// Map this error to the CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> i32 {
        match self {
            Self::Spawn(SpawnError::NonZeroExit { status, .. }) => *status,
            other => match other.category() {
                ErrorCategory::Configuration => 2,
                ErrorCategory::Substitution => 3,
                ErrorCategory::Execution | ErrorCategory::ProcessFailure => 70,
            },
        }
    }
}
