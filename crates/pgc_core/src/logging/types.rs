//! Log levels and user-facing line markers.

use serde::{Deserialize, Serialize};

/// Default verbosity, stored in the `[logging]` settings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string for `EnvFilter`.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Marker applied to lines of the conversion log shown to the user.
///
/// `Command` lines echo the exact invocation (`$ pandoc ...`), `Phase` and
/// `Section` frame the run, the bracketed ones flag outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePrefix {
    Command,
    Phase,
    Section,
    Success,
    Warning,
    Error,
    None,
}

impl MessagePrefix {
    /// Text placed before and after the message.
    fn marks(&self) -> (&'static str, &'static str) {
        match self {
            MessagePrefix::Command => ("$ ", ""),
            MessagePrefix::Phase => ("=== ", " ==="),
            MessagePrefix::Section => ("--- ", " ---"),
            MessagePrefix::Success => ("[SUCCESS] ", ""),
            MessagePrefix::Warning => ("[WARNING] ", ""),
            MessagePrefix::Error => ("[ERROR] ", ""),
            MessagePrefix::None => ("", ""),
        }
    }

    pub fn format(&self, message: &str) -> String {
        let (before, after) = self.marks();
        format!("{}{}{}", before, message, after)
    }

    /// [`format`](Self::format) plus the trailing newline.
    pub fn line(&self, message: &str) -> String {
        let mut line = self.format(message);
        line.push('\n');
        line
    }
}
