//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Where resources and profiles live.
    #[serde(default)]
    pub paths: PathSettings,

    /// External tool invocation.
    #[serde(default)]
    pub tool: ToolSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Directory layout.
///
/// Relative values are resolved against the application root injected at
/// startup (see [`super::AppPaths::from_settings`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Application base directory (EXE directory when packaged, project root otherwise).
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    /// Directory holding `filters/` and `templates/`.
    #[serde(default = "default_resource_dir")]
    pub resource_dir: String,

    /// Directory holding `<name>.yml` profiles.
    #[serde(default = "default_profiles_dir")]
    pub profiles_dir: String,
}

fn default_base_dir() -> String {
    ".".to_string()
}

fn default_resource_dir() -> String {
    "resources".to_string()
}

fn default_profiles_dir() -> String {
    "profiles".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            resource_dir: default_resource_dir(),
            profiles_dir: default_profiles_dir(),
        }
    }
}

/// External tool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Executable name or path.
    #[serde(default = "default_program")]
    pub program: String,

    /// Timeout for the `--version` pre-flight check.
    #[serde(default = "default_preflight_timeout")]
    pub preflight_timeout_secs: u64,

    /// Lines of process output kept per run for error diagnosis.
    #[serde(default = "default_output_tail")]
    pub output_tail_lines: usize,
}

fn default_program() -> String {
    "pandoc".to_string()
}

fn default_preflight_timeout() -> u64 {
    5
}

fn default_output_tail() -> usize {
    200
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            preflight_timeout_secs: default_preflight_timeout(),
            output_tail_lines: default_output_tail(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set.
    #[serde(default)]
    pub level: LogLevel,
}

/// Config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Tool,
    Logging,
}

impl ConfigSection {
    /// TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Tool => "tool",
            ConfigSection::Logging => "logging",
        }
    }
}
