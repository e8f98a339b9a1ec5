//! Logging infrastructure for cmds
//!
//! Library crates only emit `tracing` events; installing a subscriber is
//! left to the binary via [`init_tracing`].

use tracing::{Level, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize the tracing subscriber for structured logging.
///
/// `RUST_LOG` wins when set. Otherwise verbose mode enables the spawn
/// lifecycle at debug level and the default keeps only warnings.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("cmds=debug,cmds_runner=debug,cmds_tokenize=debug,info")
            } else {
                EnvFilter::try_new("warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_thread_ids(false)
        .with_thread_names(verbose)
        .with_line_number(false)
        .with_file(false);

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.with_span_events(FmtSpan::CLOSE).compact())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.compact())
            .try_init()?;
    }

    Ok(())
}

/// Create the span a spawn lifecycle is recorded under.
#[must_use]
pub fn spawn_span(cmd: &str) -> tracing::Span {
    span!(Level::DEBUG, "spawn", cmd = %cmd)
}
