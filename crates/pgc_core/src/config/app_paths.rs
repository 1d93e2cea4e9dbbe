//! Resolved application directories and resource lookup.

use std::path::{Path, PathBuf};

use super::settings::PathSettings;
use crate::paths;

/// File name of the Lua filter applied to every conversion.
pub const BUILTIN_FILTER_NAME: &str = "default_filter.lua";

/// File name of the base LaTeX header under `templates/`.
pub const HEADER_TEMPLATE_NAME: &str = "latex_header_base.tex";

/// The application's directory layout.
///
/// Built once at process start from the injected root and handed to every
/// component that needs to find bundled resources. Nothing in the core
/// inspects the environment to find these on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    base_dir: PathBuf,
    resource_dir: PathBuf,
    profiles_dir: PathBuf,
}

impl AppPaths {
    /// Create from explicit directories.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        resource_dir: impl Into<PathBuf>,
        profiles_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            resource_dir: resource_dir.into(),
            profiles_dir: profiles_dir.into(),
        }
    }

    /// Resolve the configured (possibly relative) directories against `root`.
    pub fn from_settings(settings: &PathSettings, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let base_dir = paths::resolve_against(Some(root), Path::new(&settings.base_dir));
        Self {
            resource_dir: paths::resolve_against(Some(&base_dir), Path::new(&settings.resource_dir)),
            profiles_dir: paths::resolve_against(Some(&base_dir), Path::new(&settings.profiles_dir)),
            base_dir,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn resource_dir(&self) -> &Path {
        &self.resource_dir
    }

    pub fn profiles_dir(&self) -> &Path {
        &self.profiles_dir
    }

    /// Directory of bundled filters.
    pub fn filters_dir(&self) -> PathBuf {
        self.resource_dir.join("filters")
    }

    /// Base LaTeX header used for the temporary include-in-header file.
    pub fn header_template(&self) -> PathBuf {
        self.resource_dir.join("templates").join(HEADER_TEMPLATE_NAME)
    }

    /// The built-in Lua filter, if it is installed.
    pub fn builtin_filter(&self) -> Option<PathBuf> {
        let path = self.filters_dir().join(BUILTIN_FILTER_NAME);
        path.is_file().then_some(path)
    }

    /// Resolve a user-supplied filter path.
    ///
    /// Order: absolute as-is, then `<resources>/filters/<p>`, then
    /// `<base>/<p>`. Anything else is passed through so pandoc reports it.
    pub fn resolve_filter(&self, filter: &str) -> PathBuf {
        let path = Path::new(filter);
        if path.is_absolute() {
            return path.to_path_buf();
        }

        let in_filters = self.filters_dir().join(path);
        if in_filters.exists() {
            return in_filters;
        }

        let in_base = self.base_dir.join(path);
        if in_base.exists() {
            return in_base;
        }

        tracing::debug!("Filter '{}' not found locally, passing through", filter);
        path.to_path_buf()
    }
}

/// True when a `--lua-filter` argument names the built-in filter.
///
/// Matched by file name so profiles written by an install in another
/// location still recognize it.
pub(crate) fn is_builtin_filter(value: &str) -> bool {
    Path::new(value)
        .file_name()
        .is_some_and(|name| name == BUILTIN_FILTER_NAME)
}
