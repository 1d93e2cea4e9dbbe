//! Reading and writing defaults files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use thiserror::Error;

use super::codec;
use super::types::{Project, ProjectDescriptor};
use crate::paths;

/// Top-level keys that mark a YAML mapping as a pandoc defaults file.
pub const DESCRIPTOR_KEYS: [&str; 14] = [
    "input-files",
    "output-file",
    "variables",
    "metadata",
    "from",
    "to",
    "bibliography",
    "toc",
    "number-sections",
    "citeproc",
    "pdf-engine",
    "template",
    "filters",
    "standalone",
];

/// Errors from loading or saving a defaults file.
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Failed to read project file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed project file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to write project file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0} is not a pandoc defaults file")]
    NotADescriptor(PathBuf),
}

impl DescriptorError {
    fn parse(path: &Path, message: impl ToString) -> Self {
        DescriptorError::Parse {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    fn write(path: &Path, source: io::Error) -> Self {
        DescriptorError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for descriptor file operations.
pub type DescriptorResult<T> = Result<T, DescriptorError>;

/// True when `value` is a mapping with at least one defaults-file key.
pub fn is_project_descriptor(value: &Value) -> bool {
    match value {
        Value::Mapping(map) => DESCRIPTOR_KEYS.iter().any(|key| map.contains_key(*key)),
        _ => false,
    }
}

/// Read a file as raw YAML. An empty file is an empty mapping.
fn read_value(path: &Path) -> DescriptorResult<Value> {
    let content = fs::read_to_string(path).map_err(|source| DescriptorError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_yaml::from_str(&content).map_err(|e| DescriptorError::parse(path, e))?;
    Ok(match value {
        Value::Null => Value::Mapping(Default::default()),
        other => other,
    })
}

/// Load a defaults file.
pub fn load(path: &Path) -> DescriptorResult<ProjectDescriptor> {
    let value = read_value(path)?;
    if !value.is_mapping() {
        return Err(DescriptorError::parse(path, "top level is not a mapping"));
    }
    serde_yaml::from_value(value).map_err(|e| DescriptorError::parse(path, e))
}

/// Load a defaults file and decode it against its own directory.
///
/// Unlike [`load`], a mapping with none of the known keys is rejected.
pub fn load_project(path: &Path) -> DescriptorResult<Project> {
    let value = read_value(path)?;
    if !is_project_descriptor(&value) {
        return Err(DescriptorError::NotADescriptor(path.to_path_buf()));
    }
    let descriptor: ProjectDescriptor =
        serde_yaml::from_value(value).map_err(|e| DescriptorError::parse(path, e))?;

    let base_dir = paths::absolute(path.parent().unwrap_or(Path::new(".")));
    tracing::info!("Loaded project {}", path.display());
    Ok(codec::decode(&descriptor, Some(&base_dir)))
}

/// Save a defaults file atomically, creating parent directories.
pub fn save(path: &Path, descriptor: &ProjectDescriptor) -> DescriptorResult<()> {
    let content = serde_yaml::to_string(descriptor)
        .map_err(|e| DescriptorError::write(path, io::Error::other(e)))?;
    paths::write_atomic(path, &content).map_err(|e| DescriptorError::write(path, e))?;
    tracing::info!("Saved project {}", path.display());
    Ok(())
}

/// Encode a project and save it.
pub fn save_project(path: &Path, project: &Project) -> DescriptorResult<()> {
    save(path, &codec::encode(project))
}
