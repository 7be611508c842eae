//! Build file adapter.
//!
//! Reads a module's build file into dependency records and writes back
//! declarations whose source/remote form no longer matches the desired
//! state. Only those lines are regenerated; every other line is written
//! back byte for byte.

use crate::matcher::match_dependency;
use crate::types::{DependencyMap, DependencyRecord};
use modspace_core::{ModspaceError, ModuleDescriptor, Result, TextStore};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct BuildFileAdapter {
    path: PathBuf,
    dependencies: Vec<DependencyRecord>,
    error: Option<String>,
}

impl BuildFileAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dependencies: Vec::new(),
            error: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Declarations found by the last successful read, in file order.
    pub fn dependencies(&self) -> &[DependencyRecord] {
        &self.dependencies
    }

    /// Last I/O failure. Cleared only by a successful read.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn refresh_from_store(&mut self, store: &dyn TextStore) -> Result<()> {
        self.dependencies.clear();

        let lines = store.read_lines(&self.path).map_err(|e| self.record_error(e))?;
        self.dependencies = lines.iter().filter_map(|line| match_dependency(line)).collect();
        self.error = None;

        tracing::debug!(
            "Read {} dependencies from {:?}",
            self.dependencies.len(),
            self.path
        );
        Ok(())
    }

    /// Rewrites declarations in the build file so each one named in `desired`
    /// takes its desired source/remote form. `modules` supplies the group and
    /// name for declarations regenerated in remote form.
    ///
    /// Returns the number of rewritten lines; the file is left untouched when
    /// that is zero.
    pub fn write_dependencies(
        &mut self,
        store: &dyn TextStore,
        desired: &DependencyMap,
        modules: &BTreeMap<String, ModuleDescriptor>,
    ) -> Result<usize> {
        let lines = store.read_lines(&self.path).map_err(|e| self.record_error(e))?;

        let (rewritten, changed) = rewrite_declarations(&lines, desired, modules);
        if changed == 0 {
            tracing::trace!("{:?} already matches workspace settings", self.path);
            return Ok(0);
        }

        store
            .write_lines(&self.path, &rewritten)
            .map_err(|e| self.record_error(e))?;
        tracing::info!("Rewrote {} declarations in {:?}", changed, self.path);
        Ok(changed)
    }

    fn record_error(&mut self, err: ModspaceError) -> ModspaceError {
        tracing::warn!("{}", err);
        self.error = Some(err.to_string());
        err
    }
}

/// Regenerates every line whose declaration disagrees with `desired` on
/// source/remote form, keeping the line's leading whitespace and trailing
/// `\r`. Returns the new lines and how many were changed.
pub fn rewrite_declarations(
    lines: &[String],
    desired: &DependencyMap,
    modules: &BTreeMap<String, ModuleDescriptor>,
) -> (Vec<String>, usize) {
    let mut changed = 0;
    let mut rewritten = Vec::with_capacity(lines.len());

    for line in lines {
        let wanted = match_dependency(line).and_then(|found| {
            desired
                .get(found.name())
                .filter(|wanted| wanted.is_source_dependency != found.is_source_dependency)
        });

        match wanted {
            Some(wanted) => {
                let declaration = match modules.get(wanted.name()) {
                    Some(module) => wanted.to_declaration_for(module),
                    None => wanted.to_declaration(),
                };
                rewritten.push(splice(line, &declaration));
                changed += 1;
            }
            None => rewritten.push(line.clone()),
        }
    }

    (rewritten, changed)
}

pub(super) fn splice(original: &str, declaration: &str) -> String {
    let indent_len = original.len() - original.trim_start().len();
    let mut line = String::with_capacity(indent_len + declaration.len() + 1);
    line.push_str(&original[..indent_len]);
    line.push_str(declaration);
    if original.ends_with('\r') {
        line.push('\r');
    }
    line
}
