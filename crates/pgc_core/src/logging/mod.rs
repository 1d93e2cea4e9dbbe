//! Logging infrastructure for Pandoc GUI Converter.
//!
//! Two audiences get log output:
//! - Developers, through the `tracing` ecosystem (`init_tracing`)
//! - Users, through the conversion observer's output stream, formatted
//!   with [`MessagePrefix`] so every front end shows the same markers
//!
//! # Example
//!
//! ```no_run
//! use pgc_core::logging::{init_tracing, LogLevel, MessagePrefix};
//!
//! init_tracing(LogLevel::Info);
//! println!("{}", MessagePrefix::Command.format("pandoc --version"));
//! ```

mod types;

pub use types::{LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when it is set; otherwise `default_level` applies.
/// Output goes to stderr. A second call keeps the first subscriber.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    if tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Warnings and above, captured by the test harness.
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(LogLevel::Warn.as_filter_str()))
        .with_test_writer()
        .try_init();
}
