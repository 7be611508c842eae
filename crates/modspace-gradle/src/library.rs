//! Per-module aggregate of declared dependencies.
//!
//! A [`LibraryNode`] owns the build file adapter of one module and three
//! views over its declarations: all of them, the source ones and the remote
//! ones. The last two always partition the first and are rebuilt together.

use crate::adapter::BuildFileAdapter;
use crate::types::{DependencyMap, DependencyRecord};
use modspace_core::{ModspaceError, ModuleDescriptor, Result, TextStore, resolve_relative};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryKind {
    /// Project declared directly in the settings file.
    Internal,
    /// Module listed in the workspace manifest.
    External { module: ModuleDescriptor },
}

impl LibraryKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External { .. } => "external",
        }
    }
}

/// Which modules are currently part of the workspace.
#[derive(Debug, Clone, Copy)]
pub struct InclusionPolicy<'a> {
    pub external_modules: &'a BTreeMap<String, ModuleDescriptor>,
    pub included_modules: &'a BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct LibraryNode {
    name: String,
    path: String,
    group: String,
    kind: LibraryKind,
    adapter: BuildFileAdapter,
    all_dependencies: DependencyMap,
    source_dependencies: DependencyMap,
    remote_dependencies: DependencyMap,
    /// Names of the nodes this one depends on. Filled by graph rebuilds only.
    dependent_libraries: Vec<String>,
}

impl LibraryNode {
    pub fn external(module: ModuleDescriptor, base_path: &Path, build_file: &str) -> Self {
        let build_path = resolve_relative(base_path, &module.path).join(build_file);
        Self {
            name: module.name.clone(),
            path: module.path.clone(),
            group: module.group.clone(),
            kind: LibraryKind::External { module },
            adapter: BuildFileAdapter::new(build_path),
            all_dependencies: DependencyMap::new(),
            source_dependencies: DependencyMap::new(),
            remote_dependencies: DependencyMap::new(),
            dependent_libraries: Vec::new(),
        }
    }

    /// Settings project `a:b` lives in directory `a/b`.
    pub fn internal(project: &str, base_path: &Path, build_file: &str) -> Self {
        let path = project.replace(':', "/");
        let build_path = resolve_relative(base_path, &path).join(build_file);
        Self {
            name: project.to_string(),
            path,
            group: String::new(),
            kind: LibraryKind::Internal,
            adapter: BuildFileAdapter::new(build_path),
            all_dependencies: DependencyMap::new(),
            source_dependencies: DependencyMap::new(),
            remote_dependencies: DependencyMap::new(),
            dependent_libraries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn kind(&self) -> &LibraryKind {
        &self.kind
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.kind, LibraryKind::Internal)
    }

    pub fn build_file(&self) -> &Path {
        self.adapter.path()
    }

    pub fn error(&self) -> Option<&str> {
        self.adapter.error()
    }

    pub fn all_dependencies(&self) -> &DependencyMap {
        &self.all_dependencies
    }

    pub fn source_dependencies(&self) -> &DependencyMap {
        &self.source_dependencies
    }

    pub fn remote_dependencies(&self) -> &DependencyMap {
        &self.remote_dependencies
    }

    pub fn dependent_libraries(&self) -> &[String] {
        &self.dependent_libraries
    }

    pub(crate) fn clear_dependent_libraries(&mut self) {
        self.dependent_libraries.clear();
    }

    pub(crate) fn add_dependent_library(&mut self, name: &str) {
        self.dependent_libraries.push(name.to_string());
    }

    /// Re-reads the build file.
    ///
    /// With `update_existing`, records already known are merged with their
    /// fresh observation so metadata missing from the new parse survives.
    /// Without it, the maps are rebuilt from the fresh parse alone. A failed
    /// read records the error on the node and leaves it with whatever the
    /// merge of an empty parse yields.
    pub fn refresh_dependencies(
        &mut self,
        store: &dyn TextStore,
        update_existing: bool,
    ) -> Result<()> {
        let read = self.adapter.refresh_from_store(store);
        let fresh = self.adapter.dependencies().to_vec();
        self.populate(update_existing, fresh)?;
        read
    }

    fn populate(&mut self, update_existing: bool, fresh: Vec<DependencyRecord>) -> Result<()> {
        if !update_existing {
            self.all_dependencies.clear();
        }

        for dep in fresh {
            let merged = match self.all_dependencies.remove(dep.name()) {
                Some(mut existing) if update_existing => {
                    existing.update_from(&dep)?;
                    existing
                }
                _ => dep,
            };
            self.all_dependencies.insert(merged.name().to_string(), merged);
        }

        self.repartition();
        Ok(())
    }

    fn repartition(&mut self) {
        let (source, remote): (DependencyMap, DependencyMap) = self
            .all_dependencies
            .iter()
            .map(|(name, dep)| (name.clone(), dep.clone()))
            .partition(|(_, dep)| dep.is_source_dependency);
        self.source_dependencies = source;
        self.remote_dependencies = remote;
    }

    /// Takes over a newer node observed for the same module.
    ///
    /// When path or group still match, `other` is a re-read of the same build
    /// file: its adapter is adopted and the maps re-derived from it. Otherwise
    /// `other` replaces this node's adapter, descriptor and maps wholesale.
    /// Nodes of different kinds are left untouched.
    pub fn update_from(&mut self, other: Self) -> Result<()> {
        if self.kind.label() != other.kind.label() {
            let err = ModspaceError::KindMismatch {
                name: self.name.clone(),
                expected: self.kind.label(),
                found: other.kind.label(),
            };
            tracing::error!("{}", err);
            return Err(err);
        }

        let same_entity = self.path == other.path || self.group == other.group;
        self.adapter = other.adapter;
        self.kind = other.kind;
        self.path = other.path;
        self.group = other.group;

        if same_entity {
            let fresh = self.adapter.dependencies().to_vec();
            self.populate(false, fresh)
        } else {
            tracing::debug!("Library '{}' moved to {:?}", self.name, self.path);
            self.all_dependencies = other.all_dependencies;
            self.source_dependencies = other.source_dependencies;
            self.remote_dependencies = other.remote_dependencies;
            Ok(())
        }
    }

    /// Forces every declaration of a manifest module into source form when
    /// that module is included and remote form otherwise, then persists the
    /// result to the build file. Returns the number of rewritten lines.
    pub fn ensure_dependencies_match_settings(
        &mut self,
        store: &dyn TextStore,
        policy: InclusionPolicy<'_>,
    ) -> Result<usize> {
        for (name, dep) in &mut self.all_dependencies {
            if policy.external_modules.contains_key(name) {
                dep.is_source_dependency = policy.included_modules.contains(name);
            }
        }
        self.repartition();

        self.adapter
            .write_dependencies(store, &self.all_dependencies, policy.external_modules)
    }

    /// Whether `other` is declared as a dependency of this node. Never
    /// consults graph edges.
    pub fn depends_on(&self, other: &Self) -> bool {
        self.all_dependencies.contains_key(other.name())
    }
}
