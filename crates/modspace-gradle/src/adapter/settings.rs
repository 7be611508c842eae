//! Settings file adapter.

use super::build::splice;
use crate::matcher::{include_statement_names, match_settings, project_dir_binding};
use crate::settings::{SettingsSnapshot, include_statement, project_dir_statement};
use modspace_core::{ModspaceError, Result, TextStore};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SettingsFileAdapter {
    path: PathBuf,
    snapshot: SettingsSnapshot,
    error: Option<String>,
}

impl SettingsFileAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: SettingsSnapshot::new(),
            error: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> &SettingsSnapshot {
        &self.snapshot
    }

    pub fn snapshot_mut(&mut self) -> &mut SettingsSnapshot {
        &mut self.snapshot
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Re-parses the settings file, replacing the snapshot. On failure the
    /// previous snapshot is kept and the error recorded.
    pub fn refresh_from_store(&mut self, store: &dyn TextStore) -> Result<()> {
        let lines = store.read_lines(&self.path).map_err(|e| self.record_error(e))?;
        self.snapshot = match_settings(&split_statements(&lines));
        self.error = None;
        Ok(())
    }

    /// Brings the settings file in line with the snapshot. Lines that do not
    /// register a project are written back untouched.
    pub fn write_to_store(&mut self, store: &dyn TextStore) -> Result<()> {
        let lines = store.read_lines(&self.path).map_err(|e| self.record_error(e))?;
        let updated = reconcile_settings_lines(&lines, &self.snapshot);
        if updated == lines {
            tracing::trace!("{:?} already matches the settings", self.path);
            return Ok(());
        }

        store
            .write_lines(&self.path, &updated)
            .map_err(|e| self.record_error(e))?;
        tracing::info!(
            "Wrote {} projects to {:?}",
            self.snapshot.all_projects.len(),
            self.path
        );
        Ok(())
    }

    fn record_error(&mut self, err: ModspaceError) -> ModspaceError {
        tracing::warn!("{}", err);
        self.error = Some(err.to_string());
        err
    }
}

/// Edits settings lines to register exactly the projects in `snapshot`.
///
/// An `include` statement (with its continuation lines) is kept verbatim
/// while every name it registers is still wanted, collapsed onto one line
/// when only some are, and dropped when none are. `projectDir` bindings
/// are dropped or re-pointed the same way. Projects the file does not
/// register yet are appended, before the final newline.
pub fn reconcile_settings_lines(lines: &[String], snapshot: &SettingsSnapshot) -> Vec<String> {
    let mut updated = Vec::with_capacity(lines.len() + 2);
    let mut included = BTreeSet::new();
    let mut bound = BTreeSet::new();

    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        i += 1;

        if let Some(mut names) = include_statement_names(line, false) {
            let start = i - 1;
            while let Some(more) = lines.get(i).and_then(|l| include_statement_names(l, true)) {
                names.extend(more);
                i += 1;
            }

            let kept: Vec<String> = names
                .iter()
                .filter(|name| snapshot.contains(name))
                .cloned()
                .collect();
            if kept.len() == names.len() {
                updated.extend_from_slice(&lines[start..i]);
            } else if !kept.is_empty() {
                updated.push(splice(line, &include_statement(&kept)));
            }
            included.extend(kept);
            continue;
        }

        if let Some((name, path)) = project_dir_binding(line) {
            match snapshot.external_projects.get(&name) {
                Some(wanted) if *wanted == path => updated.push(line.clone()),
                Some(wanted) => updated.push(splice(line, &project_dir_statement(&name, wanted))),
                None => continue,
            }
            bound.insert(name);
            continue;
        }

        updated.push(line.clone());
    }

    let ending = if lines.iter().any(|l| l.ends_with('\r')) { "\r" } else { "" };
    let mut additions = Vec::new();
    for name in &snapshot.all_projects {
        if !included.contains(name) {
            additions.push(format!("{}{ending}", include_statement(&[name])));
        }
        if let Some(path) = snapshot.external_projects.get(name)
            && !bound.contains(name)
        {
            additions.push(format!("{}{ending}", project_dir_statement(name, path)));
        }
    }

    let at = if updated.last().is_some_and(String::is_empty) {
        updated.len() - 1
    } else {
        updated.len()
    };
    let tail = updated.split_off(at);
    updated.extend(additions);
    updated.extend(tail);
    updated
}

/// Splits settings lines on commas so each `include` argument is matched as
/// its own piece.
fn split_statements(lines: &[String]) -> Vec<&str> {
    lines.iter().flat_map(|line| line.split(',')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use modspace_core::MemoryTextStore;

    const SETTINGS: &str = "rootProject.name = 'demo'\n\
include ':app', ':core',\n\
        ':feature:login'\n\
include ':networking'\n\
project(':networking').projectDir = new File('../networking')\n";

    #[test]
    fn test_split_statements() {
        let lines = vec!["include ':a', ':b'".to_string(), "x".to_string()];
        assert_eq!(split_statements(&lines), vec!["include ':a'", " ':b'", "x"]);
    }

    #[test]
    fn test_refresh_parses_multi_include() {
        let store = MemoryTextStore::new();
        store.insert("/ws/settings.gradle", SETTINGS);

        let mut adapter = SettingsFileAdapter::new("/ws/settings.gradle");
        adapter.refresh_from_store(&store).unwrap();

        let settings = adapter.snapshot();
        let all: Vec<&str> = settings.all_projects.iter().map(String::as_str).collect();
        assert_eq!(all, vec!["app", "core", "feature:login", "networking"]);
        assert_eq!(
            settings.external_projects.get("networking").map(String::as_str),
            Some("../networking")
        );
    }

    #[test]
    fn test_refresh_failure_keeps_snapshot() {
        let store = MemoryTextStore::new();
        store.insert("/ws/settings.gradle", "include ':app'");

        let mut adapter = SettingsFileAdapter::new("/ws/settings.gradle");
        adapter.refresh_from_store(&store).unwrap();
        store.remove(Path::new("/ws/settings.gradle"));

        assert!(adapter.refresh_from_store(&store).is_err());
        assert!(adapter.error().is_some());
        assert!(adapter.snapshot().contains("app"));
    }

    #[test]
    fn test_write_collapses_partly_removed_statement() {
        let store = MemoryTextStore::new();
        store.insert("/ws/settings.gradle", SETTINGS);

        let mut adapter = SettingsFileAdapter::new("/ws/settings.gradle");
        adapter.refresh_from_store(&store).unwrap();
        adapter.snapshot_mut().remove_project("core");
        adapter.write_to_store(&store).unwrap();

        insta::assert_snapshot!(store.get(Path::new("/ws/settings.gradle")).unwrap(), @r"
        rootProject.name = 'demo'
        include ':app', ':feature:login'
        include ':networking'
        project(':networking').projectDir = new File('../networking')
        ");
    }

    #[test]
    fn test_write_keeps_unrelated_lines() {
        let original = "pluginManagement {\n    repositories { gradlePluginPortal() }\n}\n\
rootProject.name = 'demo'\n\
// modules\n\
include ':app'\n";
        let store = MemoryTextStore::new();
        store.insert("/ws/settings.gradle", original);

        let mut adapter = SettingsFileAdapter::new("/ws/settings.gradle");
        adapter.refresh_from_store(&store).unwrap();
        adapter.snapshot_mut().add_external_project("core", "/ws/core");
        adapter.write_to_store(&store).unwrap();

        let written = store.get(Path::new("/ws/settings.gradle")).unwrap();
        assert_eq!(
            written,
            format!(
                "{original}include ':core'\nproject(':core').projectDir = new File('/ws/core')\n"
            )
        );

        adapter.refresh_from_store(&store).unwrap();
        adapter.snapshot_mut().remove_project("core");
        adapter.write_to_store(&store).unwrap();
        assert_eq!(store.get(Path::new("/ws/settings.gradle")).unwrap(), original);
    }

    #[test]
    fn test_write_keeps_crlf_endings() {
        let store = MemoryTextStore::new();
        store.insert("/ws/settings.gradle", "rootProject.name = 'demo'\r\ninclude ':app'\r\n");

        let mut adapter = SettingsFileAdapter::new("/ws/settings.gradle");
        adapter.refresh_from_store(&store).unwrap();
        adapter.snapshot_mut().add_internal_project("core");
        adapter.write_to_store(&store).unwrap();

        assert_eq!(
            store.get(Path::new("/ws/settings.gradle")).unwrap(),
            "rootProject.name = 'demo'\r\ninclude ':app'\r\ninclude ':core'\r\n"
        );
    }

    #[test]
    fn test_write_repoints_project_dir() {
        let store = MemoryTextStore::new();
        store.insert("/ws/settings.gradle", SETTINGS);

        let mut adapter = SettingsFileAdapter::new("/ws/settings.gradle");
        adapter.refresh_from_store(&store).unwrap();
        adapter
            .snapshot_mut()
            .add_external_project("networking", "/ws/networking");
        adapter.write_to_store(&store).unwrap();

        let written = store.get(Path::new("/ws/settings.gradle")).unwrap();
        assert!(written.ends_with(
            "include ':networking'\nproject(':networking').projectDir = new File('/ws/networking')\n"
        ));
        assert!(!written.contains("../networking"));
    }

    #[test]
    fn test_unchanged_snapshot_writes_file_back_verbatim() {
        let store = MemoryTextStore::new();
        store.insert("/ws/settings.gradle", SETTINGS);

        let mut adapter = SettingsFileAdapter::new("/ws/settings.gradle");
        adapter.refresh_from_store(&store).unwrap();
        let before = adapter.snapshot().all_projects.clone();
        adapter.write_to_store(&store).unwrap();
        assert_eq!(store.get(Path::new("/ws/settings.gradle")).unwrap(), SETTINGS);

        adapter.refresh_from_store(&store).unwrap();
        assert_eq!(adapter.snapshot().all_projects, before);
    }

    #[test]
    fn test_write_missing_file_records_error() {
        let store = MemoryTextStore::new();
        let mut adapter = SettingsFileAdapter::new("/ws/settings.gradle");
        assert!(adapter.write_to_store(&store).is_err());
        assert!(adapter.error().unwrap().contains("settings.gradle"));
    }
}
