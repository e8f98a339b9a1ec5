//! Command templates.
//!
//! A template is shell text with ERB-style tags and `%s` shortcuts. Values
//! substituted through tags are tokenized with [`cmds_tokenize`], so they
//! reach the shell as exactly the words intended:
//!
//! ```rust
//! use cmds_template::{Format, render};
//! use cmds_tokenize::{TokenizeOptions, Value};
//! use std::collections::BTreeMap;
//!
//! let cmd = render(
//!     "cp %s %s",
//!     &[Value::from("my file.txt"), Value::from("backup/")],
//!     &BTreeMap::new(),
//!     &TokenizeOptions::default(),
//!     Format::Squish,
//! )
//! .unwrap();
//! assert_eq!(cmd, r"cp my\ file.txt backup/");
//! ```

pub mod context;
pub mod format;
pub mod shortcuts;
pub mod template;

pub use context::RenderContext;
pub use format::Format;
pub use shortcuts::replace_shortcuts;
pub use template::{Template, render};
