//! Named OS pipes used to wire a child's standard streams.

use cmds_utils::SpawnError;
use std::fmt;
use std::io::{self, PipeReader, PipeWriter};
use std::process::Stdio;

/// Which standard stream a pipe serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamTag {
    In,
    Out,
    Err,
}

impl StreamTag {
    /// Name used for the pipe and the worker thread serving it.
    #[must_use]
    pub const fn thread_name(self) -> &'static str {
        match self {
            Self::In => "INPUT",
            Self::Out => "OUTPUT",
            Self::Err => "ERROR",
        }
    }

    #[must_use]
    pub const fn from_output(stream: OutputStream) -> Self {
        match stream {
            OutputStream::Out => Self::Out,
            OutputStream::Err => Self::Err,
        }
    }
}

impl fmt::Display for StreamTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::Out => write!(f, "out"),
            Self::Err => write!(f, "err"),
        }
    }
}

/// An output stream of the child, the only kind a reader or sink serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
    Out,
    Err,
}

impl OutputStream {
    #[must_use]
    pub const fn thread_name(self) -> &'static str {
        StreamTag::from_output(self).thread_name()
    }
}

impl From<OutputStream> for StreamTag {
    fn from(stream: OutputStream) -> Self {
        Self::from_output(stream)
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&StreamTag::from_output(*self), f)
    }
}

/// One OS pipe plus the stream it serves.
///
/// The child's end goes into the `Command` via [`Pipe::child_stdio`]; the
/// parent's end is handed to a worker thread. Each end is closed when
/// whoever took it drops it, and whatever is still held closes with the
/// `Pipe` itself.
#[derive(Debug)]
pub struct Pipe {
    tag: StreamTag,
    reader: Option<PipeReader>,
    writer: Option<PipeWriter>,
}

impl Pipe {
    /// Open a new pipe for `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError::PipeFailed`] if the OS refuses the pipe.
    pub fn new(tag: StreamTag) -> Result<Self, SpawnError> {
        let (reader, writer) = io::pipe().map_err(|source| SpawnError::PipeFailed {
            name: tag.thread_name().to_string(),
            source,
        })?;
        Ok(Self {
            tag,
            reader: Some(reader),
            writer: Some(writer),
        })
    }

    #[must_use]
    pub const fn tag(&self) -> StreamTag {
        self.tag
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.tag.thread_name()
    }

    /// Take the end the child uses: the read end for stdin, the write end
    /// for stdout and stderr.
    pub fn child_stdio(&mut self) -> Option<Stdio> {
        match self.tag {
            StreamTag::In => self.reader.take().map(Stdio::from),
            StreamTag::Out | StreamTag::Err => self.writer.take().map(Stdio::from),
        }
    }

    /// Take the parent's write end (stdin pipes only).
    pub fn take_writer(&mut self) -> Option<PipeWriter> {
        match self.tag {
            StreamTag::In => self.writer.take(),
            StreamTag::Out | StreamTag::Err => None,
        }
    }

    /// Take the parent's read end (stdout and stderr pipes only).
    pub fn take_reader(&mut self) -> Option<PipeReader> {
        match self.tag {
            StreamTag::In => None,
            StreamTag::Out | StreamTag::Err => self.reader.take(),
        }
    }

    /// Both ends have been handed off or closed.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.reader.is_none() && self.writer.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_stdin_pipe_ends() {
        let mut pipe = Pipe::new(StreamTag::In).unwrap();
        assert_eq!(pipe.name(), "INPUT");
        assert!(pipe.take_reader().is_none());
        assert!(pipe.child_stdio().is_some());
        assert!(pipe.take_writer().is_some());
        assert!(pipe.is_released());
    }

    #[test]
    fn test_output_pipe_carries_bytes() {
        let mut pipe = Pipe::new(StreamTag::Out).unwrap();
        assert!(pipe.take_writer().is_none());

        let mut reader = pipe.take_reader().unwrap();
        let mut writer = pipe.writer.take().unwrap();
        writer.write_all(b"hello\n").unwrap();
        drop(writer);

        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "hello\n");
        assert!(pipe.is_released());
    }

    #[test]
    fn test_tag_names() {
        assert_eq!(StreamTag::Out.thread_name(), "OUTPUT");
        assert_eq!(StreamTag::Err.thread_name(), "ERROR");
        assert_eq!(StreamTag::Err.to_string(), "err");
    }

    #[test]
    fn test_output_streams_map_to_output_tags() {
        assert_eq!(StreamTag::from(OutputStream::Out), StreamTag::Out);
        assert_eq!(StreamTag::from(OutputStream::Err), StreamTag::Err);
        assert_eq!(OutputStream::Err.thread_name(), "ERROR");
        assert_eq!(OutputStream::Out.to_string(), "out");
    }
}
