//! Configuration management for Pandoc GUI Converter.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - [`AppPaths`], the resolved directory layout injected once at startup
//!
//! # Example
//!
//! ```no_run
//! use pgc_core::config::{AppPaths, ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new("settings.toml");
//! config.load_or_create().unwrap();
//!
//! let paths = AppPaths::from_settings(&config.settings().paths, "/opt/pandoc-gui");
//! println!("Profiles: {}", paths.profiles_dir().display());
//!
//! config.settings_mut().tool.preflight_timeout_secs = 10;
//! config.update_section(ConfigSection::Tool).unwrap();
//! ```

mod app_paths;
mod manager;
mod settings;

pub use app_paths::{AppPaths, BUILTIN_FILTER_NAME, HEADER_TEMPLATE_NAME};
pub(crate) use app_paths::is_builtin_filter;
pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{ConfigSection, LoggingSettings, PathSettings, Settings, ToolSettings};
