//! Adapters between parsed models and the text store.

pub mod build;
pub mod settings;

pub use build::{BuildFileAdapter, rewrite_declarations};
pub use settings::{SettingsFileAdapter, reconcile_settings_lines};
