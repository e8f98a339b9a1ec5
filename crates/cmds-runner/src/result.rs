//! The outcome of a captured command.

use cmds_utils::SpawnError;
use serde::{Deserialize, Serialize};

/// Command string, exit status and captured output of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdResult {
    pub cmd: String,
    pub status: i32,
    pub out: String,
    pub err: String,
}

impl CmdResult {
    #[must_use]
    pub fn new(
        cmd: impl Into<String>,
        status: i32,
        out: impl Into<String>,
        err: impl Into<String>,
    ) -> Self {
        Self {
            cmd: cmd.into(),
            status,
            out: out.into(),
            err: err.into(),
        }
    }

    /// Build from raw captured bytes, lossily decoded.
    #[must_use]
    pub fn from_bytes(cmd: impl Into<String>, status: i32, out: &[u8], err: &[u8]) -> Self {
        Self::new(
            cmd,
            status,
            String::from_utf8_lossy(out),
            String::from_utf8_lossy(err),
        )
    }

    /// Exited with status 0.
    #[must_use]
    pub const fn ok(&self) -> bool {
        self.status == 0
    }

    #[must_use]
    pub const fn error(&self) -> bool {
        !self.ok()
    }

    /// Fail if the command failed, handing the result back otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError::NonZeroExit`] with the captured stderr.
    pub fn assert(self) -> Result<Self, SpawnError> {
        SpawnError::check_status(&self.cmd, self.status, Some(&self.err))?;
        Ok(self)
    }

    /// Stdout with one trailing line break removed.
    #[must_use]
    pub fn chomped_out(&self) -> &str {
        chomp(&self.out)
    }

    /// The result as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse stdout as JSON.
    ///
    /// # Errors
    ///
    /// Returns the parse error if stdout is not valid JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.out)
    }
}

/// Remove one trailing `\n`, `\r\n` or `\r`.
#[must_use]
pub fn chomp(s: &str) -> &str {
    s.strip_suffix("\r\n")
        .or_else(|| s.strip_suffix('\n'))
        .or_else(|| s.strip_suffix('\r'))
        .unwrap_or(s)
}
