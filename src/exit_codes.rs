//! Exit codes for the cmds CLI.
//!
//! A command that ran exits with the child's own status; failures before or
//! around the child map by error category.

use cmds_utils::CmdsError;

/// Process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// Invalid arguments or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Template substitution failed (missing value, bad template)
    pub const SUBSTITUTION: ExitCode = ExitCode(3);

    /// The command could not be run (spawn or I/O failure)
    pub const EXECUTION: ExitCode = ExitCode(70);

    /// Get the numeric exit code value.
    ///
    /// Use this with `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Exit code for an error from the CLI.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        err.downcast_ref::<CmdsError>()
            .map_or(Self::INTERNAL, |e| Self(e.to_exit_code()))
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        Self(code)
    }
}
