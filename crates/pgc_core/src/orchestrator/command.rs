//! Building pandoc invocations.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::runner::CommandLine;
use crate::header::INCLUDE_IN_HEADER;
use crate::paths;

/// `--resource-path` value for a set of inputs: their absolute parent
/// directories, de-duplicated, sorted and joined with the platform list
/// separator.
pub fn resource_path(inputs: &[PathBuf]) -> String {
    let dirs: BTreeSet<String> = inputs
        .iter()
        .map(|input| {
            let absolute = paths::absolute(input);
            let parent = absolute.parent().map(Path::to_path_buf).unwrap_or(absolute);
            paths::to_token(&parent)
        })
        .collect();
    dirs.into_iter().collect::<Vec<_>>().join(paths::LIST_SEPARATOR)
}

/// `program inputs… -o output --resource-path <dirs> tokens…`
pub fn invocation(
    program: &str,
    inputs: &[PathBuf],
    output: &Path,
    resource_path: &str,
    tokens: &[String],
) -> CommandLine {
    CommandLine::new(program)
        .args(inputs.iter().map(|p| paths::to_token(p)))
        .arg("-o")
        .arg(paths::to_token(output))
        .arg("--resource-path")
        .arg(resource_path)
        .args(tokens.iter().cloned())
}

/// Intermediate LaTeX file of a two-stage run, next to the final output.
///
/// `None` when the output already is a `.tex` file.
pub fn intermediate_path(output: &Path) -> Option<PathBuf> {
    let tex = output.with_extension("tex");
    (tex != output).then_some(tex)
}

/// Remove header includes for the second stage of a two-stage run. Both
/// `--include-in-header <file>` and `--include-in-header=<file>` are dropped.
pub fn strip_header_includes(tokens: &[String]) -> Vec<String> {
    let inline_prefix = format!("{}=", INCLUDE_IN_HEADER);
    let mut kept = Vec::with_capacity(tokens.len());
    let mut iter = tokens.iter();
    while let Some(token) = iter.next() {
        if token == INCLUDE_IN_HEADER {
            iter.next();
        } else if !token.starts_with(&inline_prefix) {
            kept.push(token.clone());
        }
    }
    kept
}
