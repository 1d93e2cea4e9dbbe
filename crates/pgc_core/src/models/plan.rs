//! File plans: which inputs a run reads and where its outputs go.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors deriving a plan from the UI's file list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("No input files selected")]
    NoInputs,
}

/// Concrete input/output layout of one conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePlan {
    /// One input, one output.
    Single { input: PathBuf, output: PathBuf },
    /// Several inputs concatenated by pandoc into one output.
    Merged { inputs: Vec<PathBuf>, output: PathBuf },
    /// Each input converted on its own to `<output_dir>/<stem>.<output_format>`.
    Batch {
        inputs: Vec<PathBuf>,
        output_dir: PathBuf,
        output_format: String,
    },
}

/// UI choices that shape the plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOptions {
    /// Target format (output extension).
    pub output_format: String,
    /// Output directory; defaults to the first input's directory.
    pub output_dir: Option<PathBuf>,
    /// Merge several inputs into one document instead of converting each.
    pub merge_files: bool,
    /// Use `output_filename` for merged output.
    pub use_custom_filename: bool,
    /// Custom merged output name (its extension, if any, is replaced).
    pub output_filename: String,
}

impl FilePlan {
    /// Derive the plan for a run from the ordered input list.
    pub fn derive(inputs: &[PathBuf], options: &PlanOptions) -> Result<Self, PlanError> {
        let first = inputs.first().ok_or(PlanError::NoInputs)?;

        let output_dir = match options.output_dir.as_ref() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => first.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let format = options.output_format.as_str();

        if inputs.len() == 1 {
            return Ok(FilePlan::Single {
                input: first.clone(),
                output: output_dir.join(format!("{}.{}", file_stem(first), format)),
            });
        }

        if !options.merge_files {
            return Ok(FilePlan::Batch {
                inputs: inputs.to_vec(),
                output_dir,
                output_format: format.to_string(),
            });
        }

        let custom = options.output_filename.trim();
        let name = if options.use_custom_filename && !custom.is_empty() {
            // Only the last extension is dropped: "report.v2.pdf" -> "report.v2".
            match custom.rsplit_once('.') {
                Some((stem, _)) if !stem.is_empty() => stem.to_string(),
                _ => custom.to_string(),
            }
        } else {
            format!("{}_merged", file_stem(first))
        };

        Ok(FilePlan::Merged {
            inputs: inputs.to_vec(),
            output: output_dir.join(format!("{}.{}", name, format)),
        })
    }

    /// All inputs, in order.
    pub fn inputs(&self) -> &[PathBuf] {
        match self {
            FilePlan::Single { input, .. } => std::slice::from_ref(input),
            FilePlan::Merged { inputs, .. } | FilePlan::Batch { inputs, .. } => inputs,
        }
    }

    /// Number of separate conversions (not counting two-stage splits).
    pub fn unit_count(&self) -> usize {
        match self {
            FilePlan::Single { .. } | FilePlan::Merged { .. } => 1,
            FilePlan::Batch { inputs, .. } => inputs.len(),
        }
    }

    /// Output path for a single batch input.
    pub fn batch_output(output_dir: &Path, input: &Path, output_format: &str) -> PathBuf {
        output_dir.join(format!("{}.{}", file_stem(input), output_format))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
