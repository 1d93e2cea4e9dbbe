//! Profile files on disk: one `<name>.yml` per profile.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::profile::Profile;
use crate::paths;

/// Name of the profile loaded at startup when it exists.
pub const DEFAULT_PROFILE_NAME: &str = "default";

const PROFILE_EXTENSION: &str = "yml";

/// Errors from profile storage.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Profile I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse profile '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize profile: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("Invalid profile name: '{0}'")]
    InvalidName(String),
}

/// Result type for profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Directory-backed profile storage.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    /// Store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sorted names of stored profiles. A missing directory is empty.
    pub fn list(&self) -> ProfileResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == PROFILE_EXTENSION) {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// True when a profile file with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|path| path.is_file())
    }

    /// Load a stored profile.
    ///
    /// An empty file loads as the built-in profile.
    pub fn load(&self, name: &str) -> ProfileResult<Profile> {
        let path = self.path_for(name)?;
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Profile::builtin());
        }
        serde_yaml::from_str(&content).map_err(|source| ProfileError::Parse {
            name: name.to_string(),
            source,
        })
    }

    /// Load a stored profile, falling back to the built-in one on any error.
    pub fn load_or_default(&self, name: &str) -> Profile {
        match self.load(name) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Using built-in profile instead of '{}': {}", name, e);
                Profile::builtin()
            }
        }
    }

    /// Profile to show at application start.
    pub fn startup(&self) -> Profile {
        if self.contains(DEFAULT_PROFILE_NAME) {
            self.load_or_default(DEFAULT_PROFILE_NAME)
        } else {
            Profile::builtin()
        }
    }

    /// Save (or overwrite) a profile.
    pub fn save(&self, name: &str, profile: &Profile) -> ProfileResult<()> {
        let path = self.path_for(name)?;
        let content = serde_yaml::to_string(profile).map_err(ProfileError::Serialize)?;
        paths::write_atomic(&path, &content)?;
        tracing::info!("Saved profile '{}'", name);
        Ok(())
    }

    /// Delete a profile. Returns `false` when it did not exist.
    pub fn delete(&self, name: &str) -> ProfileResult<bool> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("Deleted profile '{}'", name);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, name: &str) -> ProfileResult<PathBuf> {
        let trimmed = name.trim();
        let invalid = trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed.contains(['/', '\\']);
        if invalid {
            return Err(ProfileError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", trimmed, PROFILE_EXTENSION)))
    }
}
