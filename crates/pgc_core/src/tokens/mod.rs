//! Conversion between the argument model and pandoc command-line tokens.
//!
//! Encoding produces tokens in a fixed order (flags, engine, variables,
//! geometry, reader, filters, template, stylesheet, bibliography, then the
//! opaque tokens verbatim). Decoding is a single left-to-right scan that
//! recognizes the same patterns and keeps everything else as opaque tokens
//! in the order it was seen.
//!
//! ```
//! use pgc_core::models::ArgumentModel;
//! use pgc_core::tokens::{decode, TokenEncoder};
//!
//! let mut model = ArgumentModel::default();
//! model.options.table_of_contents = true;
//! model.opaque_tokens.push("--dpi=300".to_string());
//!
//! let tokens = TokenEncoder::bare().encode(&model);
//! assert_eq!(tokens, vec!["--toc", "--dpi=300"]);
//! assert_eq!(decode(&tokens), model);
//! ```

mod decode;
mod encode;
mod geometry;

pub use decode::decode;
pub use encode::TokenEncoder;
pub use geometry::{format_geometry, parse_geometry};

/// `-V` (and its long form) introduces a template variable pair.
pub(crate) fn is_variable_flag(token: &str) -> bool {
    token == "-V" || token == "--variable"
}

/// `-M` (and its long form) introduces a metadata pair.
pub(crate) fn is_metadata_flag(token: &str) -> bool {
    token == "-M" || token == "--metadata"
}

/// Prefix of the geometry variable pair (`-V geometry:top=...`).
pub(crate) const GEOMETRY_PREFIX: &str = "geometry:";
