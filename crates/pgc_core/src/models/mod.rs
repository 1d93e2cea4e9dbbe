//! Data models for Pandoc GUI Converter.
//!
//! This module contains the value objects shared by every other layer:
//! - The argument model (the UI state as one explicit value)
//! - File plans (which inputs go to which outputs for a run)

mod args;
mod plan;

pub use args::{ArgumentModel, Margins, StructuredOptions, DEFAULT_OUTPUT_FORMAT};
pub(crate) use args::non_empty;
pub use plan::{FilePlan, PlanError, PlanOptions};
