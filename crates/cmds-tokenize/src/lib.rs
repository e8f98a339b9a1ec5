//! Shell escaping and tokenization.
//!
//! Converts [`Value`]s (scalars, arrays and maps) into shell-safe tokens and
//! option maps into CLI flags, controlled by [`TokenizeOptions`]:
//!
//! ```rust
//! use cmds_tokenize::{tokenize, TokenizeOptions, Value};
//!
//! let values = [
//!     Value::from("/where ever/it/is.psql"),
//!     Value::map([("x", Value::from(1)), ("dry_run", Value::from(true))]),
//! ];
//! assert_eq!(
//!     tokenize(&values, &TokenizeOptions::default()).unwrap(),
//!     r"/where\ ever/it/is.psql --dry_run -x 1"
//! );
//! ```

pub mod escape;
pub mod options;
pub mod tokenize;
pub mod value;

pub use escape::{QuoteKind, escape, escape_value, quote, quote_dance};
pub use options::{ArrayMode, FalseMode, FalseShortOptMode, HashMode, TokenizeOptions};
pub use tokenize::{tokenize, tokenize_option, tokenize_options, tokenize_value};
pub use value::Value;
