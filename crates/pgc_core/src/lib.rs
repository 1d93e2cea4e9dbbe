//! PGC Core - backend logic for Pandoc GUI Converter
//!
//! This crate contains the translation layer between the UI state
//! ([`models::ArgumentModel`]), pandoc command-line tokens ([`tokens`]) and
//! pandoc defaults files ([`descriptor`]), plus named profiles and the
//! conversion orchestrator that drives pandoc as a subprocess.
//!
//! It has zero UI dependencies and can be used by the GUI application or a
//! headless front end.

pub mod config;
pub mod descriptor;
pub mod header;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod paths;
pub mod profiles;
pub mod tokens;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
