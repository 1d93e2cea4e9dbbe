//! Settings file handling.
//!
//! The settings live in one TOML file. A full save regenerates it with a
//! comment above each table; [`ConfigManager::update_section`] rewrites a
//! single table through `toml_edit` and leaves the rest of the file, hand
//! edits included, as it was. Every write goes through
//! [`crate::paths::write_atomic`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};
use crate::paths::write_atomic;

const FILE_BANNER: &str = "# Pandoc GUI Converter settings\n\
# Regenerated on full save; section updates keep comments elsewhere.\n\n";

/// Errors from reading or writing the settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Cannot edit {path}: {source}")]
    Edit {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },
}

impl ConfigError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Owns the in-memory [`Settings`] and the file they came from.
pub struct ConfigManager {
    path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Manager for `path` holding default settings. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory settings; persist with [`save`](Self::save) or
    /// [`update_section`](Self::update_section).
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Replace the in-memory settings with the file's contents.
    pub fn load(&mut self) -> ConfigResult<()> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(ConfigError::io(&self.path, e)),
        };
        self.settings = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!("Loaded settings from {}", self.path.display());
        Ok(())
    }

    /// [`load`](Self::load), or write the defaults when there is no file yet.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        match self.load() {
            Err(ConfigError::NotFound(_)) => {
                tracing::info!("Writing default settings to {}", self.path.display());
                self.settings = Settings::default();
                self.save()
            }
            other => other,
        }
    }

    /// Regenerate the whole file from the in-memory settings.
    pub fn save(&self) -> ConfigResult<()> {
        let mut output = String::from(FILE_BANNER);
        for section in [ConfigSection::Paths, ConfigSection::Tool, ConfigSection::Logging] {
            output.push_str(section_comment(section));
            output.push_str(&format!("\n[{}]\n", section.table_name()));
            output.push_str(&self.render(section)?);
            output.push('\n');
        }
        self.write(&output)
    }

    /// Rewrite one table of the file on disk from the in-memory settings.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let existing = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(ConfigError::io(&self.path, e)),
        };
        let mut doc: DocumentMut = existing.parse().map_err(|source| self.edit_error(source))?;

        let table: DocumentMut = self
            .render(section)?
            .parse()
            .map_err(|source| self.edit_error(source))?;
        doc[section.table_name()] = Item::Table(table.as_table().clone());

        tracing::debug!("Updated [{}] in {}", section.table_name(), self.path.display());
        self.write(&doc.to_string())
    }

    /// Body of one table, without its header line.
    fn render(&self, section: ConfigSection) -> ConfigResult<String> {
        let body = match section {
            ConfigSection::Paths => toml::to_string_pretty(&self.settings.paths)?,
            ConfigSection::Tool => toml::to_string_pretty(&self.settings.tool)?,
            ConfigSection::Logging => toml::to_string_pretty(&self.settings.logging)?,
        };
        Ok(body)
    }

    fn write(&self, content: &str) -> ConfigResult<()> {
        write_atomic(&self.path, content).map_err(|e| ConfigError::io(&self.path, e))
    }

    fn edit_error(&self, source: toml_edit::TomlError) -> ConfigError {
        ConfigError::Edit {
            path: self.path.clone(),
            source,
        }
    }
}

fn section_comment(section: ConfigSection) -> &'static str {
    match section {
        ConfigSection::Paths => "# Application, resource and profile directories",
        ConfigSection::Tool => "# External conversion tool",
        ConfigSection::Logging => "# Log level when RUST_LOG is unset",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_or_create_creates_default() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(".config").join("settings.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert!(config_path.exists());
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[paths]"));
        assert!(content.contains("[tool]"));
        assert!(content.contains("program = \"pandoc\""));
    }

    #[test]
    fn generated_config_loads_back() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.settings_mut().tool.preflight_timeout_secs = 9;
        manager.save().unwrap();

        let mut reloaded = ConfigManager::new(&config_path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.settings(), manager.settings());
    }

    #[test]
    fn load_or_create_preserves_existing() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");
        fs::write(&config_path, "[paths]\nprofiles_dir = \"my_profiles\"\n").unwrap();

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert_eq!(manager.settings().paths.profiles_dir, "my_profiles");
        assert_eq!(manager.settings().tool.program, "pandoc");
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("absent.toml"));
        assert!(matches!(manager.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn update_section_only_changes_target() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");
        fs::write(
            &config_path,
            "# keep me\n[paths]\nprofiles_dir = \"custom\"\n\n[logging]\nlevel = \"Info\"\n",
        )
        .unwrap();

        let mut manager = ConfigManager::new(&config_path);
        manager.load().unwrap();
        manager.settings_mut().logging.level = LogLevel::Debug;
        manager.update_section(ConfigSection::Logging).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("# keep me"));
        assert!(content.contains("profiles_dir = \"custom\""));
        assert!(content.contains("level = \"Debug\""));
    }

    #[test]
    fn invalid_file_reports_its_path() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");
        fs::write(&config_path, "[tool]\npreflight_timeout_secs = \"soon\"\n").unwrap();

        let mut manager = ConfigManager::new(&config_path);
        match manager.load() {
            Err(ConfigError::Parse { path, .. }) => assert_eq!(path, config_path),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn update_section_creates_missing_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nested").join("settings.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.settings_mut().tool.program = "/opt/pandoc/bin/pandoc".into();
        manager.update_section(ConfigSection::Tool).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[tool]"));
        assert!(!content.contains("[paths]"));
    }

    #[test]
    fn atomic_write_creates_no_temp_on_success() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert!(!dir.path().join("settings.toml.tmp").exists());
    }
}
