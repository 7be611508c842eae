//! Parsed view of a settings file.

use indexmap::{IndexMap, IndexSet};

/// Projects registered in the settings file, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsSnapshot {
    pub all_projects: IndexSet<String>,
    /// Projects registered with an `include` statement.
    pub internal_projects: IndexSet<String>,
    /// Projects bound to a directory with a `projectDir` assignment.
    pub external_projects: IndexMap<String, String>,
}

impl SettingsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.all_projects.contains(name)
    }

    /// Registers an external project living at `path`.
    pub fn add_external_project(&mut self, name: &str, path: impl Into<String>) {
        self.all_projects.insert(name.to_string());
        self.external_projects.insert(name.to_string(), path.into());
    }

    pub fn add_internal_project(&mut self, name: &str) {
        self.all_projects.insert(name.to_string());
        self.internal_projects.insert(name.to_string());
    }

    /// Drops every registration of `name`. Returns whether anything was removed.
    pub fn remove_project(&mut self, name: &str) -> bool {
        let all = self.all_projects.shift_remove(name);
        let internal = self.internal_projects.shift_remove(name);
        let external = self.external_projects.shift_remove(name).is_some();
        all || internal || external
    }
}

/// `include ':a', ':b'` registering every name in order.
pub fn include_statement<S: AsRef<str>>(names: &[S]) -> String {
    let args: Vec<String> = names
        .iter()
        .map(|name| format!("':{}'", name.as_ref()))
        .collect();
    format!("include {}", args.join(", "))
}

pub fn project_dir_statement(name: &str, path: &str) -> String {
    format!("project(':{name}').projectDir = new File('{path}')")
}
