//! Foundation utilities for cmds: error types, logging setup and text helpers.

pub mod error;
pub mod logging;
pub mod text;

pub use error::{
    CmdsError, ConfigError, ErrorCategory, SpawnError, TemplateError, TokenizeError,
    UserFriendlyError,
};
