//! Core abstractions for modspace.
//!
//! Holds what every modspace crate shares: the error taxonomy, the text
//! store that build and settings files are read from and written to, the
//! workspace manifest, and file naming configuration.

pub mod config;
pub mod error;
pub mod manifest;
pub mod store;

pub use config::ModspaceConfig;
pub use error::{ModspaceError, Result};
pub use manifest::{ModuleDescriptor, WorkspaceManifest, resolve_relative};
pub use store::{FsTextStore, MemoryTextStore, TextStore};
