//! Command implementations. Each one returns the text to print.

use crate::cli::Command;
use modspace_core::{FsTextStore, ModspaceConfig, Result, WorkspaceManifest};
use modspace_gradle::{WorkspaceGraph, WorkspaceStatus};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(root: &Path, config: &ModspaceConfig, command: Command) -> Result<String> {
    match command {
        Command::Init { name } => init(root, config, &name),
        Command::Status => status(root, config),
        Command::Refresh => refresh(root, config),
        Command::Include { module } => include(root, config, &module),
        Command::Exclude { module } => exclude(root, config, &module),
        Command::Watch { interval_secs } => {
            watch(root, config, Duration::from_secs(interval_secs)).await?;
            Ok(String::new())
        }
    }
}

pub fn init(root: &Path, config: &ModspaceConfig, name: &str) -> Result<String> {
    let path = root.join(&config.manifest_file);
    WorkspaceManifest::create(&path, name)?;
    Ok(format!("Created workspace '{}' in {}\n", name, path.display()))
}

pub fn open(root: &Path, config: &ModspaceConfig) -> Result<WorkspaceGraph> {
    WorkspaceGraph::open(root, config.clone(), Arc::new(FsTextStore))
}

/// Reports the workspace without rewriting any build file.
pub fn status(root: &Path, config: &ModspaceConfig) -> Result<String> {
    let graph = WorkspaceGraph::scan(root, config.clone(), Arc::new(FsTextStore))?;
    Ok(render_status(&graph.status()))
}

/// Opening a workspace already runs a full update.
pub fn refresh(root: &Path, config: &ModspaceConfig) -> Result<String> {
    let graph = open(root, config)?;
    let status = graph.status();
    let failed = status.modules.iter().filter(|m| m.error.is_some()).count();
    Ok(format!(
        "Refreshed workspace '{}': {} modules, {} included, {} with errors\n",
        status.name,
        status.modules.len(),
        status.modules.iter().filter(|m| m.included).count(),
        failed
    ))
}

pub fn include(root: &Path, config: &ModspaceConfig, module: &str) -> Result<String> {
    open(root, config)?.include_module(module)?;
    Ok(format!("Included '{module}'\n"))
}

pub fn exclude(root: &Path, config: &ModspaceConfig, module: &str) -> Result<String> {
    open(root, config)?.exclude_module(module)?;
    Ok(format!("Excluded '{module}'\n"))
}

/// Re-reads the manifest and runs an incremental update every `interval`
/// until Ctrl-C.
pub async fn watch(root: &Path, config: &ModspaceConfig, interval: Duration) -> Result<()> {
    let graph = Arc::new(open(root, config)?);
    tracing::info!(
        "Watching workspace '{}' every {:?}",
        graph.name(),
        interval
    );

    watch_until(graph, interval, async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, stopping watch"),
            Err(e) => tracing::error!("Unable to listen for Ctrl+C: {}", e),
        }
    })
    .await
}

/// Reloads `graph` every `interval` until `shutdown` completes. A manifest
/// that fails to load leaves the workspace untouched.
pub async fn watch_until(
    graph: Arc<WorkspaceGraph>,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; the workspace was just opened.
    ticker.tick().await;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let graph = Arc::clone(&graph);
                match tokio::task::spawn_blocking(move || graph.reload(true)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::warn!("Keeping previous manifest: {}", e),
                    Err(e) => tracing::error!("Refresh task failed: {}", e),
                }
            }
            () = &mut shutdown => return Ok(()),
        }
    }
}

pub fn render_status(status: &WorkspaceStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Workspace '{}'", status.name);
    if let Some(error) = &status.settings_error {
        let _ = writeln!(out, "  settings: {error}");
    }

    for module in &status.modules {
        let mark = if module.included { 'x' } else { ' ' };
        let primary = if module.primary { " (primary)" } else { "" };
        let _ = writeln!(
            out,
            "  [{mark}] {}{primary}  {}  {}",
            module.name, module.group, module.path
        );
        if !module.dependencies.is_empty() {
            let _ = writeln!(out, "      depends on: {}", module.dependencies.join(", "));
        }
        if let Some(error) = &module.error {
            let _ = writeln!(out, "      error: {error}");
        }
    }

    let _ = writeln!(out, "Roots: {}", status.root_modules.join(", "));
    out
}
