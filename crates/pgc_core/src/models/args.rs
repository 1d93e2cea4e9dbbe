//! The argument model: one conversion configuration as a plain value.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Output format used when nothing else is known.
pub const DEFAULT_OUTPUT_FORMAT: &str = "pdf";

/// Page margins for the LaTeX `geometry` package.
///
/// Unset fields are omitted from the generated geometry option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footskip: Option<String>,
}

impl Margins {
    /// Same margin on all four sides (footskip untouched).
    pub fn uniform(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            top: Some(value.clone()),
            bottom: Some(value.clone()),
            left: Some(value.clone()),
            right: Some(value),
            footskip: None,
        }
    }

    /// True when no margin is set.
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Set fields as `(key, value)` pairs in geometry order:
    /// top, bottom, left, right, footskip. Values are trimmed and blank
    /// ones skipped.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("top", &self.top),
            ("bottom", &self.bottom),
            ("left", &self.left),
            ("right", &self.right),
            ("footskip", &self.footskip),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().and_then(non_empty).map(|v| (key, v)))
    }

    fn slots_mut(&mut self) -> [&mut Option<String>; 5] {
        [
            &mut self.top,
            &mut self.bottom,
            &mut self.left,
            &mut self.right,
            &mut self.footskip,
        ]
    }

    /// Mutable slot for a geometry key, `None` for keys we do not track.
    pub fn slot_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            "top" => Some(&mut self.top),
            "bottom" => Some(&mut self.bottom),
            "left" => Some(&mut self.left),
            "right" => Some(&mut self.right),
            "footskip" => Some(&mut self.footskip),
            _ => None,
        }
    }
}

/// The fixed set of typed options the UI exposes as widgets.
///
/// Empty strings mean "not set"; they never produce a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredOptions {
    /// `--wrap=preserve`
    #[serde(default)]
    pub wrap_preserve: bool,
    /// `--toc`
    #[serde(default)]
    pub table_of_contents: bool,
    /// `--number-sections`
    #[serde(default)]
    pub number_sections: bool,
    /// `--citeproc`
    #[serde(default)]
    pub citeproc: bool,
    /// `--standalone`
    #[serde(default)]
    pub standalone: bool,
    /// `--pdf-engine=<value>`
    #[serde(default)]
    pub pdf_engine: String,
    /// `-V documentclass=<value>`
    #[serde(default)]
    pub document_class: String,
    /// `-V classoption=<value>`
    #[serde(default)]
    pub class_option: String,
    /// `--from <value>`, e.g. `markdown+hard_line_breaks`
    #[serde(default)]
    pub markdown_extensions: String,
    /// `-V fontsize=<value>`
    #[serde(default)]
    pub font_size: String,
    /// `-V papersize=<value>`
    #[serde(default)]
    pub paper_size: String,
    /// `-V geometry:<...>`
    #[serde(default)]
    pub margins: Margins,
}

/// A complete conversion configuration.
///
/// This is the single value the UI reads from and writes to at its
/// synchronization points (profile load, project load, save, run).
/// Everything pandoc accepts that has no typed field here lives in
/// `opaque_tokens`, in the order it was entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentModel {
    /// Target format, used as the output extension.
    pub output_format: String,
    /// Typed widget options.
    #[serde(default)]
    pub options: StructuredOptions,
    /// Custom pandoc template.
    #[serde(default)]
    pub template_path: Option<String>,
    /// Additional Lua filter (the built-in filter is always applied separately).
    #[serde(default)]
    pub lua_filter_path: Option<String>,
    /// Stylesheet for HTML output.
    #[serde(default)]
    pub css_path: Option<String>,
    /// Bibliography database.
    #[serde(default)]
    pub bibliography_path: Option<String>,
    /// Document metadata.
    #[serde(default)]
    pub metadata: IndexMap<String, String>,
    /// Unrecognized tokens, passed through verbatim.
    #[serde(default)]
    pub opaque_tokens: Vec<String>,
}

impl Default for ArgumentModel {
    fn default() -> Self {
        Self {
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            options: StructuredOptions::default(),
            template_path: None,
            lua_filter_path: None,
            css_path: None,
            bibliography_path: None,
            metadata: IndexMap::new(),
            opaque_tokens: Vec::new(),
        }
    }
}

impl ArgumentModel {
    /// Create an empty model for the given output format.
    pub fn new(output_format: impl Into<String>) -> Self {
        Self {
            output_format: output_format.into(),
            ..Default::default()
        }
    }

    /// Append free-form arguments the way the "custom arguments" box does:
    /// one token per non-blank line, trimmed.
    pub fn push_custom_lines(&mut self, text: &str) {
        self.opaque_tokens.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }

    /// Trim every typed text value and clear the blank ones, the same way
    /// the encoder reads them. A normalized model survives
    /// encode-then-decode unchanged.
    pub fn normalize(&mut self) {
        let opts = &mut self.options;
        for text in [
            &mut self.output_format,
            &mut opts.pdf_engine,
            &mut opts.document_class,
            &mut opts.class_option,
            &mut opts.markdown_extensions,
            &mut opts.font_size,
            &mut opts.paper_size,
        ] {
            trim_in_place(text);
        }

        let margins = opts.margins.slots_mut();
        let paths = [
            &mut self.template_path,
            &mut self.lua_filter_path,
            &mut self.css_path,
            &mut self.bibliography_path,
        ];
        for slot in margins.into_iter().chain(paths) {
            *slot = slot.as_deref().and_then(non_empty).map(str::to_string);
        }
    }

    /// Opaque tokens rendered back into the custom arguments box.
    pub fn custom_lines(&self) -> String {
        self.opaque_tokens.join("\n")
    }
}

fn trim_in_place(text: &mut String) {
    let trimmed = text.trim();
    if trimmed.len() != text.len() {
        *text = trimmed.to_string();
    }
}

/// Treat empty strings as absent.
pub(crate) fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
