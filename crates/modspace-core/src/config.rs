//! File naming configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MANIFEST_FILE: &str = "workspace.manifest";
pub const DEFAULT_BUILD_FILE: &str = "build.gradle";
pub const DEFAULT_SETTINGS_FILE: &str = "settings.gradle";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModspaceConfig {
    /// Manifest file name, relative to the workspace base path.
    pub manifest_file: String,
    /// Build file name inside each module directory.
    pub build_file: String,
    /// Settings file name inside the manifest's `settingsPath` directory.
    pub settings_file: String,
}

impl Default for ModspaceConfig {
    fn default() -> Self {
        Self {
            manifest_file: DEFAULT_MANIFEST_FILE.to_string(),
            build_file: DEFAULT_BUILD_FILE.to_string(),
            settings_file: DEFAULT_SETTINGS_FILE.to_string(),
        }
    }
}
