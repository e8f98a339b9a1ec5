//! Capturing a command's output into a [`CmdResult`].

use cmds_utils::SpawnError;
use tracing::debug;

use crate::io_handler::{Input, IoHandler, Sink};
use crate::result::CmdResult;
use crate::spawn::{SpawnOptions, Spawner};

impl Spawner {
    /// Run `cmd` collecting stdout and stderr.
    ///
    /// When the spawner asserts, a failing command is an error carrying
    /// the captured stderr.
    ///
    /// # Errors
    ///
    /// See [`Spawner::spawn`].
    pub fn capture(&self, cmd: &str, input: Option<Input>) -> Result<CmdResult, SpawnError> {
        let mut out = Vec::new();
        let mut err = Vec::new();

        let status = {
            let mut handler = IoHandler::new();
            if let Some(input) = input {
                handler.set_input(input);
            }
            handler
                .set_out(Sink::writer(&mut out))
                .set_err(Sink::writer(&mut err));
            self.run(cmd, handler)?
        };

        let result = CmdResult::from_bytes(cmd, status, &out, &err);
        debug!(
            status,
            out_bytes = out.len(),
            err_bytes = err.len(),
            "captured"
        );

        if self.options().assert {
            result.assert()
        } else {
            Ok(result)
        }
    }
}

/// Capture `cmd` with `options`.
///
/// # Errors
///
/// See [`Spawner::capture`].
pub fn capture(
    cmd: &str,
    input: Option<Input>,
    options: &SpawnOptions,
) -> Result<CmdResult, SpawnError> {
    Spawner::new(options.clone()).capture(cmd, input)
}
