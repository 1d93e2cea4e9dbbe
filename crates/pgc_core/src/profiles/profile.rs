//! The persisted profile shape.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::{non_empty, ArgumentModel, PlanOptions, DEFAULT_OUTPUT_FORMAT};
use crate::tokens::{self, TokenEncoder};

/// A named, reusable set of conversion settings.
///
/// Options are stored as their token encoding (`extra_args`) so a profile
/// written by hand with arbitrary pandoc arguments loads without loss.
/// File-path options live in their own keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "default_output_format")]
    pub output_format: String,

    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Additional Lua filter (the built-in filter is not stored).
    #[serde(default)]
    pub lua_filter: String,

    #[serde(default)]
    pub template: String,

    #[serde(default)]
    pub css_file: String,

    #[serde(default)]
    pub bibliography: String,

    #[serde(default = "default_true")]
    pub merge_files: bool,

    #[serde(default)]
    pub use_custom_filename: bool,

    #[serde(default)]
    pub output_filename: String,

    /// `MaxMatrixCols` for the generated LaTeX header; 0 disables the header.
    #[serde(default = "default_max_matrix_cols")]
    pub max_matrix_cols: u32,

    #[serde(default)]
    pub metadata: IndexMap<String, String>,
}

fn default_output_format() -> String {
    DEFAULT_OUTPUT_FORMAT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_matrix_cols() -> u32 {
    20
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            output_format: default_output_format(),
            extra_args: Vec::new(),
            lua_filter: String::new(),
            template: String::new(),
            css_file: String::new(),
            bibliography: String::new(),
            merge_files: true,
            use_custom_filename: false,
            output_filename: String::new(),
            max_matrix_cols: default_max_matrix_cols(),
            metadata: IndexMap::new(),
        }
    }
}

impl Profile {
    /// The profile used when no `default` profile is stored.
    pub fn builtin() -> Self {
        let extra_args = [
            "--wrap=preserve",
            "--pdf-engine=xelatex",
            "-V",
            "documentclass=bxjsarticle",
            "-V",
            "classoption=pandoc",
            "--from",
            "markdown+hard_line_breaks",
        ];
        Self {
            extra_args: extra_args.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Snapshot a model. Run settings (merge, file name, matrix columns)
    /// keep their defaults; use [`Profile::apply_model`] to keep existing ones.
    pub fn from_model(model: &ArgumentModel) -> Self {
        let mut profile = Self::default();
        profile.apply_model(model);
        profile
    }

    /// Replace the model-derived fields, leaving run settings alone.
    pub fn apply_model(&mut self, model: &ArgumentModel) {
        let take = |value: &Option<String>| {
            value
                .as_deref()
                .and_then(non_empty)
                .map(str::to_string)
                .unwrap_or_default()
        };

        self.output_format = model.output_format.clone();
        self.lua_filter = take(&model.lua_filter_path);
        self.template = take(&model.template_path);
        self.css_file = take(&model.css_path);
        self.bibliography = take(&model.bibliography_path);
        self.metadata = model.metadata.clone();

        let options_only = ArgumentModel {
            template_path: None,
            lua_filter_path: None,
            css_path: None,
            bibliography_path: None,
            ..model.clone()
        };
        self.extra_args = TokenEncoder::bare().encode(&options_only);
    }

    /// Rebuild the model. Dedicated path keys win over path options found
    /// in `extra_args`.
    pub fn to_model(&self) -> ArgumentModel {
        let mut model = tokens::decode(&self.extra_args);
        if let Some(format) = non_empty(&self.output_format) {
            model.output_format = format.to_string();
        }

        let slots = [
            (&self.lua_filter, &mut model.lua_filter_path),
            (&self.template, &mut model.template_path),
            (&self.css_file, &mut model.css_path),
            (&self.bibliography, &mut model.bibliography_path),
        ];
        for (value, slot) in slots {
            if let Some(value) = non_empty(value) {
                *slot = Some(value.to_string());
            }
        }

        model.metadata.extend(self.metadata.clone());
        model
    }

    /// Plan options carried by this profile.
    pub fn plan_options(&self, output_dir: Option<PathBuf>) -> PlanOptions {
        PlanOptions {
            output_format: self.output_format.clone(),
            output_dir,
            merge_files: self.merge_files,
            use_custom_filename: self.use_custom_filename,
            output_filename: self.output_filename.clone(),
        }
    }
}
