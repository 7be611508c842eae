//! Gradle support for modspace.
//!
//! Keeps a multi-module Gradle workspace consistent with its inclusion
//! policy:
//! - `settings.gradle` decides which manifest modules are part of the
//!   workspace
//! - `build.gradle` declarations of included modules are rewritten to
//!   `project(":name")` form, everything else back to `group:name:version`
//!
//! Rewrites touch only the declaration lines that need to change and keep
//! their indentation.

pub mod adapter;
pub mod library;
pub mod matcher;
pub mod settings;
pub mod types;
pub mod workspace;

pub use adapter::{
    BuildFileAdapter, SettingsFileAdapter, reconcile_settings_lines, rewrite_declarations,
};
pub use library::{InclusionPolicy, LibraryKind, LibraryNode};
pub use matcher::{match_dependency, match_settings};
pub use settings::{SettingsSnapshot, include_statement, project_dir_statement};
pub use types::{DependencyMap, DependencyRecord, IncludeType, QuoteStyle, UNKNOWN_VERSION};
pub use workspace::{ModuleStatus, WorkspaceGraph, WorkspaceStatus};
