//! Workspace manifest: the list of external modules a workspace can pull in
//! as source.
//!
//! ```json
//! {
//!   "name": "app",
//!   "settingsPath": "",
//!   "modules": [
//!     { "name": "networking", "path": "../networking", "group": "com.example" }
//!   ]
//! }
//! ```

use crate::error::{ModspaceError, Result};
use crate::store::{FsTextStore, TextStore, join_lines};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    /// Module directory, relative to the workspace base path.
    pub path: String,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceManifest {
    pub name: String,
    /// Directory holding the settings file, relative to the workspace base path.
    #[serde(default)]
    pub settings_path: String,
    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,
}

impl WorkspaceManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings_path: String::new(),
            modules: Vec::new(),
        }
    }

    pub fn from_json(content: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(content).map_err(|source| ModspaceError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::load_from(&FsTextStore, path)
    }

    /// Reads and parses the manifest at `path` through `store`.
    pub fn load_from(store: &dyn TextStore, path: &Path) -> Result<Self> {
        tracing::debug!("Loading workspace manifest: {:?}", path);
        let content = join_lines(&store.read_lines(path)?);
        let manifest = Self::from_json(&content, path)?;
        tracing::debug!(
            "Loaded workspace '{}' with {} modules",
            manifest.name,
            manifest.modules.len()
        );
        Ok(manifest)
    }

    /// Writes an empty manifest named `name` to `path`. Refuses to replace an
    /// existing file.
    pub fn create(path: &Path, name: &str) -> Result<Self> {
        if path.exists() {
            return Err(ModspaceError::ManifestExists {
                path: path.to_path_buf(),
            });
        }
        let manifest = Self::new(name);
        let json = serde_json::to_string_pretty(&manifest).map_err(|source| {
            ModspaceError::Manifest {
                path: path.to_path_buf(),
                source,
            }
        })?;
        std::fs::write(path, json + "\n").map_err(|e| ModspaceError::from_io(path, e))?;
        tracing::info!("Created workspace manifest {:?}", path);
        Ok(manifest)
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|m| m.name == name)
    }
}

/// Joins a manifest-relative path onto `base`, tolerating a leading `/`.
pub fn resolve_relative(base: &Path, relative: &str) -> PathBuf {
    let trimmed = relative.trim_start_matches(['/', '\\']);
    if trimmed.is_empty() {
        base.to_path_buf()
    } else {
        base.join(trimmed)
    }
}
