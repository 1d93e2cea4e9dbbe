//! Conversion orchestrator.
//!
//! This module provides:
//! - [`Orchestrator`], the `Idle -> Running -> done` state machine
//! - Single, merged, batch and two-stage (via LaTeX) runs
//! - Pre-flight tool check, cancellation and per-run output capture
//! - [`ToolRunner`], the process seam, with [`TokioRunner`] as the real one
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use pgc_core::config::{AppPaths, Settings};
//! use pgc_core::models::FilePlan;
//! use pgc_core::orchestrator::{ConversionRequest, Orchestrator, TracingObserver};
//! use pgc_core::profiles::Profile;
//! use pgc_core::tokens::TokenEncoder;
//!
//! # async fn example() {
//! let settings = Settings::default();
//! let paths = AppPaths::from_settings(&settings.paths, ".");
//! let model = Profile::builtin().to_model();
//!
//! let inputs = vec![PathBuf::from("chapter1.md")];
//! let plan = FilePlan::derive(&inputs, &Profile::builtin().plan_options(None)).unwrap();
//! let request = ConversionRequest {
//!     plan,
//!     tokens: TokenEncoder::new(&paths).encode(&model),
//!     two_stage: false,
//! };
//!
//! let mut orchestrator = Orchestrator::with_tokio(settings.tool.clone());
//! let report = orchestrator.run(request, &TracingObserver).await;
//! println!("{:?} after {:?}", report.outcome, report.elapsed);
//! # }
//! ```

mod command;
mod errors;
mod machine;
mod observer;
mod runner;
mod types;

pub use command::{intermediate_path, invocation, resource_path, strip_header_includes};
pub use errors::{ConversionError, ConversionResult};
pub use machine::Orchestrator;
pub use observer::{ConversionObserver, TracingObserver};
pub use runner::{CancelHandle, CommandLine, ProcessExit, TokioRunner, ToolRunner};
pub use types::{
    ConversionJob, ConversionRequest, OutputStream, RunOutcome, RunReport, RunState, RunSummary,
    Stage,
};
