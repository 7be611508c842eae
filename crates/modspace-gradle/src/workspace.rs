//! Workspace dependency graph and inclusion policy.
//!
//! [`WorkspaceGraph`] discovers every module a workspace can hold (manifest
//! modules plus projects declared directly in the settings file), wires them
//! into a dependency graph and pushes the live inclusion policy down into the
//! build files of every module that is part of the workspace.
//!
//! Nodes live in a name-keyed arena; graph edges are node names, so a node
//! can be replaced in place without invalidating anything that points at it.

use crate::adapter::SettingsFileAdapter;
use crate::library::{InclusionPolicy, LibraryNode};
use crate::settings::SettingsSnapshot;
use modspace_core::{
    ModspaceConfig, ModspaceError, ModuleDescriptor, Result, TextStore, WorkspaceManifest,
    resolve_relative,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Snapshot of one manifest module, as reported by [`WorkspaceGraph::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleStatus {
    pub name: String,
    pub path: String,
    pub group: String,
    pub included: bool,
    /// The module named like the workspace itself.
    pub primary: bool,
    pub error: Option<String>,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceStatus {
    pub name: String,
    pub modules: Vec<ModuleStatus>,
    pub root_modules: Vec<String>,
    pub settings_error: Option<String>,
}

/// Everything the workspace lock guards.
struct GraphState {
    manifest: WorkspaceManifest,
    settings: SettingsFileAdapter,
    /// Every known node, external and internal.
    nodes: BTreeMap<String, LibraryNode>,
    /// Manifest modules. Each one also has a node in `nodes`.
    external_modules: BTreeMap<String, ModuleDescriptor>,
    included_modules: BTreeSet<String>,
    root_modules: Vec<String>,
}

pub struct WorkspaceGraph {
    base_path: PathBuf,
    config: ModspaceConfig,
    store: Arc<dyn TextStore>,
    state: Mutex<GraphState>,
}

impl WorkspaceGraph {
    /// Builds the graph and runs a full update.
    pub fn new(
        base_path: impl Into<PathBuf>,
        manifest: WorkspaceManifest,
        config: ModspaceConfig,
        store: Arc<dyn TextStore>,
    ) -> Self {
        Self::build(base_path.into(), manifest, config, store, true)
    }

    /// Loads the manifest found under `base_path` through `store` and builds
    /// the graph.
    pub fn open(
        base_path: impl Into<PathBuf>,
        config: ModspaceConfig,
        store: Arc<dyn TextStore>,
    ) -> Result<Self> {
        let base_path = base_path.into();
        let manifest = load_manifest(&base_path, &config, store.as_ref())?;
        Ok(Self::build(base_path, manifest, config, store, true))
    }

    /// Like [`open`](Self::open), but leaves every build file as it is.
    /// Later updates and inclusion changes enforce the policy as usual.
    pub fn scan(
        base_path: impl Into<PathBuf>,
        config: ModspaceConfig,
        store: Arc<dyn TextStore>,
    ) -> Result<Self> {
        let base_path = base_path.into();
        let manifest = load_manifest(&base_path, &config, store.as_ref())?;
        Ok(Self::build(base_path, manifest, config, store, false))
    }

    fn build(
        base_path: PathBuf,
        manifest: WorkspaceManifest,
        config: ModspaceConfig,
        store: Arc<dyn TextStore>,
        enforce: bool,
    ) -> Self {
        let settings = SettingsFileAdapter::new(settings_path(&base_path, &manifest, &config));
        let graph = Self {
            base_path,
            config,
            store,
            state: Mutex::new(GraphState {
                manifest,
                settings,
                nodes: BTreeMap::new(),
                external_modules: BTreeMap::new(),
                included_modules: BTreeSet::new(),
                root_modules: Vec::new(),
            }),
        };
        {
            let mut state = graph.lock();
            graph.update_locked(&mut state, false, enforce);
        }
        graph
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn config(&self) -> &ModspaceConfig {
        &self.config
    }

    pub fn name(&self) -> String {
        self.lock().manifest.name.clone()
    }

    fn lock(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-reads settings and build files, rebuilds the graph and enforces the
    /// inclusion policy.
    ///
    /// With `update_existing`, nodes that survive the refresh keep their
    /// identity. Without it, every node is rebuilt from scratch. File errors
    /// are recorded on the affected node and do not stop the update.
    pub fn update(&self, update_existing: bool) {
        let mut state = self.lock();
        self.update_locked(&mut state, update_existing, true);
    }

    /// Re-reads the manifest through the store, then updates. A manifest that
    /// fails to load leaves the graph untouched.
    pub fn reload(&self, update_existing: bool) -> Result<()> {
        let manifest = load_manifest(&self.base_path, &self.config, self.store.as_ref())?;
        self.replace_manifest(manifest, update_existing);
        Ok(())
    }

    /// Swaps in a newer manifest, then updates.
    pub fn replace_manifest(&self, manifest: WorkspaceManifest, update_existing: bool) {
        let mut state = self.lock();
        let path = settings_path(&self.base_path, &manifest, &self.config);
        if path != state.settings.path() {
            tracing::debug!("Settings file moved to {:?}", path);
            state.settings = SettingsFileAdapter::new(path);
        }
        state.manifest = manifest;
        self.update_locked(&mut state, update_existing, true);
    }

    fn update_locked(&self, state: &mut GraphState, update_existing: bool, enforce: bool) {
        let store = self.store.as_ref();

        if !update_existing {
            state.nodes.clear();
            state.external_modules.clear();
            state.root_modules.clear();
        }

        // Failure is recorded on the adapter and the previous snapshot kept.
        let _ = state.settings.refresh_from_store(store);

        state.reconcile_modules(store, &self.base_path, &self.config.build_file, update_existing);
        state.rebuild_graph();
        state.recompute_included();
        if enforce {
            state.propagate_compliance(store);
        }

        tracing::info!(
            "Workspace '{}' updated: {} modules, {} included, {} roots",
            state.manifest.name,
            state.nodes.len(),
            state.included_modules.len(),
            state.root_modules.len()
        );
    }

    /// Adds a manifest module to the workspace as source and rewrites every
    /// affected build file.
    ///
    /// The settings file is written first; if that fails the workspace is
    /// left exactly as it was and no build file is touched.
    pub fn include_module(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        let module = state.external_module(name)?;

        let path = resolve_relative(&self.base_path, &module.path);
        state.write_settings(self.store.as_ref(), |settings| {
            settings.add_external_project(&module.name, path.display().to_string());
        })?;

        state.included_modules.insert(module.name);
        state.propagate_compliance(self.store.as_ref());
        tracing::info!("Included module '{}'", name);
        Ok(())
    }

    /// Removes a manifest module from the workspace. Build files are only
    /// revisited when the module was actually included, and never when the
    /// settings file could not be written.
    pub fn exclude_module(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        let module = state.external_module(name)?;

        state.write_settings(self.store.as_ref(), |settings| {
            settings.remove_project(&module.name);
        })?;

        if state.included_modules.remove(&module.name) {
            state.propagate_compliance(self.store.as_ref());
        }
        tracing::info!("Excluded module '{}'", name);
        Ok(())
    }

    pub fn root_modules(&self) -> Vec<String> {
        self.lock().root_modules.clone()
    }

    /// Graph edges out of `name`, or `None` for an unknown node.
    pub fn dependents_of(&self, name: &str) -> Option<Vec<String>> {
        self.lock()
            .nodes
            .get(name)
            .map(|node| node.dependent_libraries().to_vec())
    }

    pub fn included_modules(&self) -> Vec<String> {
        self.lock().included_modules.iter().cloned().collect()
    }

    pub fn external_modules(&self) -> Vec<ModuleDescriptor> {
        self.lock().external_modules.values().cloned().collect()
    }

    pub fn potential_modules(&self) -> Vec<String> {
        self.lock().nodes.keys().cloned().collect()
    }

    pub fn node(&self, name: &str) -> Option<LibraryNode> {
        self.lock().nodes.get(name).cloned()
    }

    pub fn settings(&self) -> SettingsSnapshot {
        self.lock().settings.snapshot().clone()
    }

    pub fn module_error(&self, name: &str) -> Option<String> {
        self.lock()
            .nodes
            .get(name)
            .and_then(|node| node.error().map(str::to_string))
    }

    pub fn status(&self) -> WorkspaceStatus {
        let state = self.lock();
        let modules = state
            .external_modules
            .values()
            .map(|module| {
                let node = state.nodes.get(&module.name);
                ModuleStatus {
                    name: module.name.clone(),
                    path: module.path.clone(),
                    group: module.group.clone(),
                    included: state.included_modules.contains(&module.name),
                    primary: module.name == state.manifest.name,
                    error: node.and_then(|n| n.error().map(str::to_string)),
                    dependencies: node
                        .map(|n| n.all_dependencies().keys().cloned().collect())
                        .unwrap_or_default(),
                }
            })
            .collect();

        WorkspaceStatus {
            name: state.manifest.name.clone(),
            modules,
            root_modules: state.root_modules.clone(),
            settings_error: state.settings.error().map(str::to_string),
        }
    }
}

impl GraphState {
    /// Applies `edit` to the settings snapshot and writes it out, restoring
    /// the previous snapshot when the write fails.
    fn write_settings(
        &mut self,
        store: &dyn TextStore,
        edit: impl FnOnce(&mut SettingsSnapshot),
    ) -> Result<()> {
        let previous = self.settings.snapshot().clone();
        edit(self.settings.snapshot_mut());
        self.settings.write_to_store(store).inspect_err(|_| {
            *self.settings.snapshot_mut() = previous;
        })
    }

    fn external_module(&self, name: &str) -> Result<ModuleDescriptor> {
        self.external_modules
            .get(name)
            .cloned()
            .ok_or_else(|| ModspaceError::ModuleNotFound {
                name: name.to_string(),
            })
    }

    /// Brings the node set in line with the manifest and the settings file.
    fn reconcile_modules(
        &mut self,
        store: &dyn TextStore,
        base_path: &Path,
        build_file: &str,
        update_existing: bool,
    ) {
        let mut unseen: BTreeSet<String> = if update_existing {
            self.external_modules.keys().cloned().collect()
        } else {
            BTreeSet::new()
        };
        let mut external_modules = BTreeMap::new();

        for module in &self.manifest.modules {
            let mut fresh = LibraryNode::external(module.clone(), base_path, build_file);
            // Read failures stay on the node as its error.
            let _ = fresh.refresh_dependencies(store, false);

            match self.nodes.get_mut(&module.name) {
                Some(existing) if update_existing && !existing.is_internal() => {
                    if let Err(e) = existing.update_from(fresh) {
                        tracing::error!("Failed to update module '{}': {}", module.name, e);
                    }
                }
                _ => {
                    self.nodes.insert(module.name.clone(), fresh);
                }
            }
            unseen.remove(&module.name);
            external_modules.insert(module.name.clone(), module.clone());
        }

        for name in &unseen {
            tracing::debug!("Module '{}' left the manifest", name);
            self.nodes.remove(name);
        }
        self.external_modules = external_modules;

        let internal_projects = &self.settings.snapshot().internal_projects;
        self.nodes.retain(|name, node| {
            !node.is_internal() || internal_projects.contains(name.as_str())
        });

        for project in internal_projects {
            if self.external_modules.contains_key(project) {
                continue;
            }

            let mut fresh = LibraryNode::internal(project, base_path, build_file);
            let _ = fresh.refresh_dependencies(store, false);

            match self.nodes.get_mut(project) {
                Some(existing) if update_existing => {
                    if let Err(e) = existing.update_from(fresh) {
                        tracing::error!("Failed to update project '{}': {}", project, e);
                    }
                }
                _ => {
                    self.nodes.insert(project.clone(), fresh);
                }
            }
        }

        tracing::debug!(
            "Reconciled {} external and {} total modules",
            self.external_modules.len(),
            self.nodes.len()
        );
    }

    /// Recomputes every node's outgoing edges and the set of roots.
    fn rebuild_graph(&mut self) {
        let mut roots: BTreeSet<String> = self.nodes.keys().cloned().collect();
        let mut edges: Vec<(String, String)> = Vec::new();

        for (current_name, current) in &self.nodes {
            for (peer_name, peer) in &self.nodes {
                if current_name == peer_name {
                    continue;
                }
                if peer.depends_on(current) {
                    roots.remove(current_name);
                }
                if current.depends_on(peer) {
                    edges.push((current_name.clone(), peer_name.clone()));
                }
            }
        }

        for node in self.nodes.values_mut() {
            node.clear_dependent_libraries();
        }
        for (from, to) in &edges {
            if let Some(node) = self.nodes.get_mut(from) {
                node.add_dependent_library(to);
            }
        }

        self.root_modules = roots.into_iter().collect();
        tracing::debug!(
            "Rebuilt graph: {} edges, roots {:?}",
            edges.len(),
            self.root_modules
        );
    }

    fn recompute_included(&mut self) {
        self.included_modules = self
            .settings
            .snapshot()
            .all_projects
            .iter()
            .filter(|name| self.external_modules.contains_key(name.as_str()))
            .cloned()
            .collect();
    }

    /// Breadth-first from the roots, rewriting each in-workspace node before
    /// the nodes it depends on.
    fn propagate_compliance(&mut self, store: &dyn TextStore) {
        let Self {
            nodes,
            external_modules,
            included_modules,
            root_modules,
            ..
        } = self;
        let policy = InclusionPolicy {
            external_modules: &*external_modules,
            included_modules: &*included_modules,
        };

        let mut visited = BTreeSet::new();
        let mut queue: VecDeque<String> = root_modules.iter().cloned().collect();

        while let Some(name) = queue.pop_front() {
            let Some(node) = nodes.get_mut(&name) else {
                continue;
            };
            let in_workspace = node.is_internal() || policy.included_modules.contains(&name);
            if visited.contains(&name) || !in_workspace {
                continue;
            }
            visited.insert(name.clone());

            match node.ensure_dependencies_match_settings(store, policy) {
                Ok(_) => {}
                // Already recorded on the node.
                Err(e) if e.is_io() => tracing::debug!("Skipping '{}': {}", name, e),
                Err(e) => tracing::error!("Failed to enforce settings on '{}': {}", name, e),
            }
            queue.extend(node.dependent_libraries().iter().cloned());
        }

        tracing::debug!("Enforced inclusion policy on {} modules", visited.len());
    }
}

fn load_manifest(
    base_path: &Path,
    config: &ModspaceConfig,
    store: &dyn TextStore,
) -> Result<WorkspaceManifest> {
    WorkspaceManifest::load_from(store, &base_path.join(&config.manifest_file))
}

fn settings_path(
    base_path: &Path,
    manifest: &WorkspaceManifest,
    config: &ModspaceConfig,
) -> PathBuf {
    resolve_relative(base_path, &manifest.settings_path).join(&config.settings_file)
}
