//! Named conversion profiles.
//!
//! This module provides:
//! - [`Profile`], the persisted subset of the argument model plus run settings
//! - [`ProfileStore`], one YAML file per profile in a directory
//!
//! # Example
//!
//! ```no_run
//! use pgc_core::profiles::{Profile, ProfileStore};
//!
//! let store = ProfileStore::new("profiles");
//! let mut model = store.startup().to_model();
//! model.options.table_of_contents = true;
//! store.save("with-toc", &Profile::from_model(&model)).unwrap();
//! ```

mod profile;
mod store;

pub use profile::Profile;
pub use store::{ProfileError, ProfileResult, ProfileStore, DEFAULT_PROFILE_NAME};
