//! Spawning a shell command with concurrently pumped standard streams.

use cmds_utils::SpawnError;
use cmds_utils::logging::spawn_span;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, PipeReader, PipeWriter, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::Sender;
use std::thread::{self, Scope, ScopedJoinHandle};
use tracing::{Span, debug, trace, warn};

use crate::io_handler::{Input, IoHandler, Message};
use crate::pipe::{OutputStream, Pipe, StreamTag};

/// Process-level options for one spawn.
///
/// # Example
///
/// ```rust
/// use cmds_runner::SpawnOptions;
///
/// let options = SpawnOptions::new()
///     .env("PGPASSWORD", "secret")
///     .chdir("/tmp")
///     .assert(true);
///
/// assert_eq!(options.env.get("PGPASSWORD").map(String::as_str), Some("secret"));
/// ```
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    /// Merged into the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Start from an empty environment instead of the inherited one.
    pub unset_env: bool,
    /// Working directory; `None` inherits the current one.
    pub chdir: Option<PathBuf>,
    /// Fail with [`SpawnError::NonZeroExit`] on a non-zero status.
    pub assert: bool,
    /// Shell program and the arguments placed before the command string.
    pub shell: Vec<OsString>,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            env: BTreeMap::new(),
            unset_env: false,
            chdir: None,
            assert: false,
            shell: default_shell(),
        }
    }
}

#[cfg(windows)]
fn default_shell() -> Vec<OsString> {
    vec![OsString::from("cmd"), OsString::from("/C")]
}

#[cfg(not(windows))]
fn default_shell() -> Vec<OsString> {
    vec![OsString::from("/bin/sh"), OsString::from("-c")]
}

impl SpawnOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn envs<I, K, V>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(envs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub const fn unset_env(mut self, unset: bool) -> Self {
        self.unset_env = unset;
        self
    }

    #[must_use]
    pub fn chdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chdir = Some(dir.into());
        self
    }

    #[must_use]
    pub const fn assert(mut self, assert: bool) -> Self {
        self.assert = assert;
        self
    }

    /// Replace the shell, e.g. `shell("bash", ["-c"])`.
    #[must_use]
    pub fn shell<I, S>(mut self, program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.shell = std::iter::once(program.into())
            .chain(args.into_iter().map(Into::into))
            .collect();
        self
    }

    /// Build the `Command` that runs `cmd` through the shell.
    #[must_use]
    pub fn to_command(&self, cmd: &str) -> Command {
        let (program, args) = match self.shell.split_first() {
            Some((program, args)) => (program.clone(), args),
            None => (default_shell().swap_remove(0), &[][..]),
        };

        let mut command = Command::new(program);
        command.args(args).arg(cmd);

        if self.unset_env {
            command.env_clear();
        }
        command.envs(&self.env);

        if let Some(ref dir) = self.chdir {
            command.current_dir(dir);
        }

        command
    }
}

/// How a caller configures I/O for one spawn.
#[derive(Default)]
pub enum IoBlock<'a> {
    #[default]
    None,
    /// Supplies the input, like a block taking no arguments.
    Input(Box<dyn FnOnce() -> Input + 'a>),
    /// Configures the handler directly.
    Handler(Box<dyn FnOnce(&mut IoHandler<'a>) + 'a>),
}

impl<'a> IoBlock<'a> {
    pub fn input(f: impl FnOnce() -> Input + 'a) -> Self {
        Self::Input(Box::new(f))
    }

    pub fn handler(f: impl FnOnce(&mut IoHandler<'a>) + 'a) -> Self {
        Self::Handler(Box::new(f))
    }

    /// Resolve the block and the `input` argument into one handler.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError::ConflictingInput`] if both supply input.
    pub fn into_handler(self, input: Option<Input>) -> Result<IoHandler<'a>, SpawnError> {
        let mut handler = IoHandler::new();
        let from_block = match self {
            Self::None => false,
            Self::Input(f) => {
                if input.is_some() {
                    return Err(SpawnError::ConflictingInput);
                }
                handler.set_input(f());
                true
            }
            Self::Handler(f) => {
                f(&mut handler);
                handler.has_input()
            }
        };

        match input {
            Some(_) if from_block => Err(SpawnError::ConflictingInput),
            Some(input) => {
                handler.set_input(input);
                Ok(handler)
            }
            None => Ok(handler),
        }
    }
}

/// A spawned child waited on by its own thread.
struct ProcessHandle<'scope> {
    pid: u32,
    wait: ScopedJoinHandle<'scope, io::Result<ExitStatus>>,
}

impl ProcessHandle<'_> {
    fn join(self) -> Result<i32, SpawnError> {
        let status = self
            .wait
            .join()
            .map_err(|_| SpawnError::WorkerPanicked {
                name: "WAIT".to_string(),
            })?
            .map_err(|source| SpawnError::Io {
                name: "WAIT".to_string(),
                source,
            })?;
        let code = exit_code(status);
        debug!(pid = self.pid, status = code, "process exited");
        Ok(code)
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Payload for the INPUT thread.
enum Feed {
    Bytes(Vec<u8>),
    Reader(Box<dyn Read + Send>),
}

/// Runs shell commands, recording the lifecycle under an injected span.
#[derive(Debug, Clone, Default)]
pub struct Spawner {
    options: SpawnOptions,
    span: Option<Span>,
}

impl Spawner {
    #[must_use]
    pub const fn new(options: SpawnOptions) -> Self {
        Self {
            options,
            span: None,
        }
    }

    /// Record events under `span` instead of a fresh `spawn` span.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub const fn options(&self) -> &SpawnOptions {
        &self.options
    }

    /// Spawn `cmd`, pump its streams and return its exit status.
    ///
    /// # Errors
    ///
    /// - [`SpawnError::ConflictingInput`] if `input` and `io` both supply input.
    /// - [`SpawnError::SpawnFailed`] / [`SpawnError::PipeFailed`] on OS failures.
    /// - [`SpawnError::NonZeroExit`] for a failing command when asserting.
    pub fn spawn(&self, cmd: &str, input: Option<Input>, io: IoBlock<'_>) -> Result<i32, SpawnError> {
        let handler = io.into_handler(input)?;
        let status = self.run(cmd, handler)?;
        if self.options.assert {
            SpawnError::check_status(cmd, status, None)?;
        }
        Ok(status)
    }

    /// Spawn with an already configured handler, never asserting.
    ///
    /// # Errors
    ///
    /// See [`Spawner::spawn`]; also [`SpawnError::HandlerAlreadyStarted`].
    pub fn run(&self, cmd: &str, mut handler: IoHandler<'_>) -> Result<i32, SpawnError> {
        let span = self.span.clone().unwrap_or_else(|| spawn_span(cmd));
        let _entered = span.enter();

        handler.start()?;
        let mut command = self.options.to_command(cmd);

        let input = handler.take_input();
        debug!(input = ?input, "planning stdin");
        let (mut in_pipe, feed) = match input {
            Input::None => (Some(Pipe::new(StreamTag::In)?), None),
            Input::Bytes(bytes) => (Some(Pipe::new(StreamTag::In)?), Some(Feed::Bytes(bytes))),
            Input::Reader(reader) => (Some(Pipe::new(StreamTag::In)?), Some(Feed::Reader(reader))),
            Input::File(file) => {
                command.stdin(file);
                (None, None)
            }
            Input::Inherit => {
                command.stdin(Stdio::inherit());
                (None, None)
            }
        };
        if let Some(pipe) = in_pipe.as_mut()
            && let Some(stdio) = pipe.child_stdio()
        {
            command.stdin(stdio);
        }

        let mut out_pipe = plan_output(&mut command, &handler, OutputStream::Out)?;
        let mut err_pipe = plan_output(&mut command, &handler, OutputStream::Err)?;

        let child = command.spawn().map_err(|source| SpawnError::SpawnFailed {
            cmd: cmd.to_string(),
            source,
        })?;
        // The Command still holds the child's pipe ends; drop them so our
        // readers see EOF when the child exits.
        drop(command);
        debug!(pid = child.id(), "spawned");

        // Empty input closes at once; no thread needed.
        let in_writer = in_pipe.as_mut().and_then(Pipe::take_writer);
        let in_writer = match feed {
            Some(feed) => in_writer.map(|writer| (writer, feed)),
            None => {
                drop(in_writer);
                None
            }
        };
        let out_reader = out_pipe.as_mut().and_then(Pipe::take_reader);
        let err_reader = err_pipe.as_mut().and_then(Pipe::take_reader);
        trace!(
            writer = in_writer.is_some(),
            out = out_reader.is_some(),
            err = err_reader.is_some(),
            "parent pipe ends taken"
        );

        thread::scope(|scope| -> Result<i32, SpawnError> {
            let process = spawn_wait(scope, child, &span)?;

            let writer = in_writer
                .map(|(writer, feed)| spawn_writer(scope, writer, feed, &span))
                .transpose()?;

            let mut readers = Vec::with_capacity(2);
            let mut open = 0;
            for (tag, reader) in [(OutputStream::Out, out_reader), (OutputStream::Err, err_reader)] {
                if let Some(reader) = reader {
                    let tx = handler.sender().ok_or(SpawnError::HandlerAlreadyStarted)?;
                    readers.push((tag, spawn_reader(scope, reader, tag, tx, &span)?));
                    open += 1;
                }
            }

            let drained = handler.drain(open);
            debug!(streams = open, "drain finished");

            let written = match writer {
                Some(handle) => handle
                    .join()
                    .map_err(|_| SpawnError::WorkerPanicked {
                        name: StreamTag::In.thread_name().to_string(),
                    })
                    .and_then(|res| {
                        res.map_err(|source| SpawnError::Io {
                            name: StreamTag::In.thread_name().to_string(),
                            source,
                        })
                    }),
                None => Ok(()),
            };

            let mut read = Ok(());
            for (tag, handle) in readers {
                if handle.join().is_err() && read.is_ok() {
                    read = Err(SpawnError::WorkerPanicked {
                        name: tag.thread_name().to_string(),
                    });
                }
            }

            let status = process.join()?;
            written?;
            read?;
            drained?;
            Ok(status)
        })
    }
}

fn plan_output(
    command: &mut Command,
    handler: &IoHandler<'_>,
    tag: OutputStream,
) -> Result<Option<Pipe>, SpawnError> {
    let sink = handler.sink(tag);
    let stdio = sink.passthrough().map_err(|source| SpawnError::Io {
        name: tag.thread_name().to_string(),
        source,
    })?;
    trace!(stream = %tag, sink = ?sink, "planning output");

    let (stdio, pipe) = match stdio {
        Some(stdio) => (Some(stdio), None),
        None => {
            let mut pipe = Pipe::new(tag.into())?;
            (pipe.child_stdio(), Some(pipe))
        }
    };
    if let Some(stdio) = stdio {
        match tag {
            OutputStream::Out => command.stdout(stdio),
            OutputStream::Err => command.stderr(stdio),
        };
    }
    Ok(pipe)
}

fn named(tag: &str) -> thread::Builder {
    thread::Builder::new().name(tag.to_string())
}

fn spawn_wait<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    mut child: Child,
    span: &Span,
) -> Result<ProcessHandle<'scope>, SpawnError> {
    let pid = child.id();
    let span = span.clone();
    let wait = named("WAIT")
        .spawn_scoped(scope, move || {
            let _entered = span.enter();
            child.wait()
        })
        .map_err(|source| SpawnError::Io {
            name: "WAIT".to_string(),
            source,
        })?;
    Ok(ProcessHandle { pid, wait })
}

fn spawn_writer<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    writer: PipeWriter,
    feed: Feed,
    span: &Span,
) -> Result<ScopedJoinHandle<'scope, io::Result<()>>, SpawnError> {
    let span = span.clone();
    named(StreamTag::In.thread_name())
        .spawn_scoped(scope, move || {
            let _entered = span.enter();
            write_input(writer, feed)
        })
        .map_err(|source| SpawnError::Io {
            name: StreamTag::In.thread_name().to_string(),
            source,
        })
}

fn spawn_reader<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    reader: PipeReader,
    tag: OutputStream,
    tx: Sender<Message>,
    span: &Span,
) -> Result<ScopedJoinHandle<'scope, ()>, SpawnError> {
    let span = span.clone();
    named(tag.thread_name())
        .spawn_scoped(scope, move || {
            let _entered = span.enter();
            read_lines(reader, tag, &tx);
        })
        .map_err(|source| SpawnError::Io {
            name: tag.thread_name().to_string(),
            source,
        })
}

/// Write the whole feed, then close. A child that stops reading early is
/// not an error.
fn write_input(mut writer: PipeWriter, feed: Feed) -> io::Result<()> {
    let result = match feed {
        Feed::Bytes(bytes) => writer.write_all(&bytes),
        Feed::Reader(mut reader) => io::copy(&mut reader, &mut writer).map(|_| ()),
    };
    drop(writer);

    match result {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("child closed stdin before reading all input");
            Ok(())
        }
        other => {
            trace!("input written");
            other
        }
    }
}

/// Push every line onto the queue, then the end-of-stream marker.
fn read_lines(reader: PipeReader, tag: OutputStream, tx: &Sender<Message>) {
    let mut reader = BufReader::new(reader);
    let mut lines = 0usize;
    loop {
        let mut line = Vec::new();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                lines += 1;
                if tx.send(Message { tag, line: Some(line) }).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(stream = %tag, error = %e, "read failed, treating as end of stream");
                break;
            }
        }
    }
    trace!(stream = %tag, lines, "stream finished");
    let _ = tx.send(Message { tag, line: None });
}

/// Spawn `cmd` with `options` and the default span.
///
/// # Errors
///
/// See [`Spawner::spawn`].
pub fn spawn(
    cmd: &str,
    input: Option<Input>,
    options: &SpawnOptions,
    io: IoBlock<'_>,
) -> Result<i32, SpawnError> {
    Spawner::new(options.clone()).spawn(cmd, input, io)
}
