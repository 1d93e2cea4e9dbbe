//! Temporary LaTeX header passed with `--include-in-header`.
//!
//! The header raises `MaxMatrixCols` so large matrices compile. It only
//! matters to the LaTeX stage, which is why the orchestrator strips
//! [`INCLUDE_IN_HEADER`] pairs from the second stage of a two-stage run.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::config::AppPaths;
use crate::paths;

/// Pandoc option naming a file to include in the LaTeX preamble.
pub const INCLUDE_IN_HEADER: &str = "--include-in-header";

/// Preamble used when no base header is installed.
const FALLBACK_HEADER: &str = "\\usepackage{amsmath,amssymb,amsthm,mathrsfs}
\\usepackage{unicode-math}
\\renewcommand\\boldsymbol{\\symbf}
\\newcommand\\bm{\\symbf}";

/// A generated header file. The file is removed when this is dropped, so
/// holding it for the duration of a run cleans up on success, failure and
/// cancellation alike.
#[derive(Debug)]
pub struct LatexHeader {
    file: NamedTempFile,
}

impl LatexHeader {
    /// Write the header for `max_matrix_cols`. Returns `None` for 0, which
    /// means no header is wanted.
    pub fn create(paths: &AppPaths, max_matrix_cols: u32) -> io::Result<Option<Self>> {
        if max_matrix_cols == 0 {
            return Ok(None);
        }

        let template = paths.header_template();
        let base = match fs::read_to_string(&template) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(
                    "No base header at {} ({}), using built-in preamble",
                    template.display(),
                    e
                );
                FALLBACK_HEADER.to_string()
            }
        };

        let mut file = tempfile::Builder::new()
            .prefix("pgc_header_")
            .suffix(".tex")
            .tempfile()?;
        write!(
            file,
            "{}\n\n% Dynamic settings\n\\setcounter{{MaxMatrixCols}}{{{}}}\n",
            base.trim_end(),
            max_matrix_cols
        )?;
        file.flush()?;

        tracing::debug!("Wrote LaTeX header {}", file.path().display());
        Ok(Some(Self { file }))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// `--include-in-header <path>` as two tokens.
    pub fn tokens(&self) -> [String; 2] {
        [INCLUDE_IN_HEADER.to_string(), paths::to_token(self.path())]
    }
}
