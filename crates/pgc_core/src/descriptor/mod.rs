//! Pandoc defaults files ("project files").
//!
//! This module provides:
//! - [`ProjectDescriptor`], the serde view of a defaults file
//! - [`decode`] / [`encode`] between descriptors and a [`Project`]
//! - Loading, atomic saving and detection of defaults files
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use pgc_core::descriptor;
//!
//! let project = descriptor::load_project(Path::new("book/project.yaml")).unwrap();
//! println!("{} inputs", project.input_files.len());
//! descriptor::save_project(Path::new("book/project.yaml"), &project).unwrap();
//! ```

mod codec;
mod file;
mod types;

pub use codec::{decode, encode};
pub use file::{
    is_project_descriptor, load, load_project, save, save_project, DescriptorError,
    DescriptorResult, DESCRIPTOR_KEYS,
};
pub use types::{Project, ProjectDescriptor, VariableValue};
