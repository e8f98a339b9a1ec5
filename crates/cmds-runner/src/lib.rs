//! Spawning shell commands while pumping their standard streams.
//!
//! A [`Spawner`] runs a finished command string through the shell. Stdin
//! may be fed from bytes or any reader on an `INPUT` thread; stdout and
//! stderr may be delivered line by line to callbacks on the calling thread,
//! each read by its own `OUTPUT` / `ERROR` thread and funneled through the
//! [`IoHandler`] queue. A `WAIT` thread collects the exit status.
//!
//! ```rust,no_run
//! use cmds_runner::{IoHandler, SpawnOptions, Spawner};
//!
//! let mut counted = String::new();
//! let mut handler = IoHandler::new();
//! handler
//!     .set_input("a\nb\nc\nd\n")
//!     .on_out(|line| counted.push_str(line.trim()));
//!
//! let status = Spawner::new(SpawnOptions::default())
//!     .run("wc -l", handler)
//!     .unwrap();
//! assert_eq!(status, 0);
//! ```

pub mod capture;
pub mod io_handler;
pub mod pipe;
pub mod result;
pub mod spawn;

pub use capture::capture;
pub use io_handler::{Input, IoHandler, Message, Sink};
pub use pipe::{OutputStream, Pipe, StreamTag};
pub use result::{CmdResult, chomp};
pub use spawn::{IoBlock, SpawnOptions, Spawner, spawn};
