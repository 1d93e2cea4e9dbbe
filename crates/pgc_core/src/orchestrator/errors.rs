//! Error types for conversion runs.

use std::io;

use thiserror::Error;

/// Why a run (or one batch item) did not succeed.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The pre-flight `--version` check failed; nothing was started.
    #[error("{tool} is not available: {reason}")]
    ToolUnavailable { tool: String, reason: String },

    /// The tool ran and exited non-zero (`-1` when killed by a signal).
    #[error("{tool} failed with exit code {exit_code}")]
    ProcessFailure { tool: String, exit_code: i32 },

    /// The tool could not be started.
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// Filesystem work around an invocation failed.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// The plan had no inputs.
    #[error("Nothing to convert")]
    EmptyPlan,
}

impl ConversionError {
    /// Create a tool unavailable error.
    pub fn tool_unavailable(tool: impl Into<String>, reason: impl ToString) -> Self {
        Self::ToolUnavailable {
            tool: tool.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a process failure error.
    pub fn process_failure(tool: impl Into<String>, exit_code: i32) -> Self {
        Self::ProcessFailure {
            tool: tool.into(),
            exit_code,
        }
    }

    /// Create a spawn error.
    pub fn spawn(tool: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            tool: tool.into(),
            source,
        }
    }

    /// Create an I/O error with context.
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Exit code of a failed process, if that is what this is.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ProcessFailure { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

/// Result type for conversion operations.
pub type ConversionResult<T> = Result<T, ConversionError>;
