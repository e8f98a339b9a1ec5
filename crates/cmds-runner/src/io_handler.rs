//! Stream sources, sinks and the queue that serializes output delivery.

use cmds_utils::SpawnError;
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::process::Stdio;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, trace};

use crate::pipe::OutputStream;

/// Where the child's stdin comes from.
#[derive(Default)]
pub enum Input {
    /// Empty stdin: a pipe that is closed straight away.
    #[default]
    None,
    /// Bytes pushed through a pipe by a writer thread.
    Bytes(Vec<u8>),
    /// Any reader, copied through a pipe by a writer thread.
    Reader(Box<dyn Read + Send>),
    /// A file handed to the child directly.
    File(File),
    /// The parent's own stdin.
    Inherit,
}

impl Input {
    /// Wrap any reader.
    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        Self::Reader(Box::new(reader))
    }

    /// Needs a pipe and a writer thread rather than being handed to the child.
    #[must_use]
    pub const fn is_piped(&self) -> bool {
        matches!(self, Self::None | Self::Bytes(_) | Self::Reader(_))
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Self::Reader(_) => write!(f, "Reader"),
            Self::File(file) => f.debug_tuple("File").field(file).finish(),
            Self::Inherit => write!(f, "Inherit"),
        }
    }
}

impl From<&str> for Input {
    fn from(s: &str) -> Self {
        Self::Bytes(s.as_bytes().to_vec())
    }
}

impl From<String> for Input {
    fn from(s: String) -> Self {
        Self::Bytes(s.into_bytes())
    }
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Input {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<File> for Input {
    fn from(file: File) -> Self {
        Self::File(file)
    }
}

/// Where one of the child's output streams goes.
///
/// `Inherit`, `Null` and `File` are handed to the child as is. `Lines` and
/// `Writer` are fed line by line on the thread that called spawn.
#[derive(Default)]
pub enum Sink<'a> {
    #[default]
    Inherit,
    Null,
    File(File),
    /// Called with every line, terminator included.
    Lines(Box<dyn FnMut(&str) + 'a>),
    /// Receives the raw bytes of every line.
    Writer(Box<dyn Write + 'a>),
}

impl<'a> Sink<'a> {
    pub fn lines(callback: impl FnMut(&str) + 'a) -> Self {
        Self::Lines(Box::new(callback))
    }

    pub fn writer(writer: impl Write + 'a) -> Self {
        Self::Writer(Box::new(writer))
    }

    /// Needs a pipe and a reader thread.
    #[must_use]
    pub const fn is_piped(&self) -> bool {
        matches!(self, Self::Lines(_) | Self::Writer(_))
    }

    /// The `Stdio` to hand the child for pass-through sinks.
    pub(crate) fn passthrough(&self) -> io::Result<Option<Stdio>> {
        Ok(match self {
            Self::Inherit => Some(Stdio::inherit()),
            Self::Null => Some(Stdio::null()),
            Self::File(file) => Some(Stdio::from(file.try_clone()?)),
            Self::Lines(_) | Self::Writer(_) => None,
        })
    }

    fn deliver(&mut self, line: &[u8]) -> io::Result<()> {
        match self {
            Self::Lines(callback) => {
                callback(&String::from_utf8_lossy(line));
                Ok(())
            }
            Self::Writer(writer) => writer.write_all(line),
            Self::Inherit | Self::Null | Self::File(_) => Ok(()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Writer(writer) => writer.flush(),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Sink<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inherit => write!(f, "Inherit"),
            Self::Null => write!(f, "Null"),
            Self::File(file) => f.debug_tuple("File").field(file).finish(),
            Self::Lines(_) => write!(f, "Lines"),
            Self::Writer(_) => write!(f, "Writer"),
        }
    }
}

/// A line read by a worker, or `None` once its stream hit end-of-file.
#[derive(Debug)]
pub struct Message {
    pub tag: OutputStream,
    pub line: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerState {
    NotStarted,
    Started,
    Finished,
}

/// Per-spawn registry of the stdin source, the two output sinks and the
/// queue through which reader threads hand lines back.
///
/// A handler is single use: it is started once by the spawner and
/// finished when its drain loop ends.
pub struct IoHandler<'a> {
    input: Option<Input>,
    out: Sink<'a>,
    err: Sink<'a>,
    queue_tx: Option<Sender<Message>>,
    queue_rx: Receiver<Message>,
    state: HandlerState,
}

impl Default for IoHandler<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IoHandler<'a> {
    #[must_use]
    pub fn new() -> Self {
        let (queue_tx, queue_rx) = mpsc::channel();
        Self {
            input: None,
            out: Sink::Inherit,
            err: Sink::Inherit,
            queue_tx: Some(queue_tx),
            queue_rx,
            state: HandlerState::NotStarted,
        }
    }

    /// Set the stdin source.
    pub fn set_input(&mut self, input: impl Into<Input>) -> &mut Self {
        self.input = Some(input.into());
        self
    }

    pub fn set_out(&mut self, sink: Sink<'a>) -> &mut Self {
        self.out = sink;
        self
    }

    pub fn set_err(&mut self, sink: Sink<'a>) -> &mut Self {
        self.err = sink;
        self
    }

    /// Deliver stdout lines to `callback`.
    pub fn on_out(&mut self, callback: impl FnMut(&str) + 'a) -> &mut Self {
        self.set_out(Sink::lines(callback))
    }

    /// Deliver stderr lines to `callback`.
    pub fn on_err(&mut self, callback: impl FnMut(&str) + 'a) -> &mut Self {
        self.set_err(Sink::lines(callback))
    }

    #[must_use]
    pub const fn has_input(&self) -> bool {
        self.input.is_some()
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state != HandlerState::NotStarted
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == HandlerState::Finished
    }

    pub(crate) fn take_input(&mut self) -> Input {
        self.input.take().unwrap_or_default()
    }

    pub(crate) fn sink(&self, stream: OutputStream) -> &Sink<'a> {
        match stream {
            OutputStream::Out => &self.out,
            OutputStream::Err => &self.err,
        }
    }

    fn sink_mut(&mut self, stream: OutputStream) -> &mut Sink<'a> {
        match stream {
            OutputStream::Out => &mut self.out,
            OutputStream::Err => &mut self.err,
        }
    }

    /// Move from not started to started.
    pub(crate) fn start(&mut self) -> Result<(), SpawnError> {
        if self.state != HandlerState::NotStarted {
            return Err(SpawnError::HandlerAlreadyStarted);
        }
        self.state = HandlerState::Started;
        Ok(())
    }

    /// A sender for a reader thread.
    pub(crate) fn sender(&self) -> Option<Sender<Message>> {
        self.queue_tx.clone()
    }

    /// Pop messages and dispatch them to the sinks until `open` streams
    /// have sent their end-of-stream marker.
    ///
    /// A failing sink does not stop the loop, so the readers are never left
    /// blocked; the first failure is returned once every stream is done.
    pub(crate) fn drain(&mut self, mut open: usize) -> Result<(), SpawnError> {
        // Only worker senders remain, so the loop ends even if one dies early.
        self.queue_tx = None;

        let mut first_error: Option<SpawnError> = None;
        while open > 0 {
            let Ok(Message { tag, line }) = self.queue_rx.recv() else {
                debug!(open, "queue closed before every stream finished");
                break;
            };
            let Some(line) = line else {
                trace!(stream = %tag, "end of stream");
                open -= 1;
                continue;
            };
            if let Err(source) = self.sink_mut(tag).deliver(&line)
                && first_error.is_none()
            {
                first_error = Some(SpawnError::Io {
                    name: tag.thread_name().to_string(),
                    source,
                });
            }
        }

        for (tag, sink) in [(OutputStream::Out, &mut self.out), (OutputStream::Err, &mut self.err)] {
            if let Err(source) = sink.flush()
                && first_error.is_none()
            {
                first_error = Some(SpawnError::Io {
                    name: tag.thread_name().to_string(),
                    source,
                });
            }
        }

        self.state = HandlerState::Finished;
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for IoHandler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoHandler")
            .field("input", &self.input)
            .field("out", &self.out)
            .field("err", &self.err)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
