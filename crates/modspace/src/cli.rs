use clap::{Parser, Subcommand};
use modspace_core::ModspaceConfig;
use modspace_core::config::{DEFAULT_BUILD_FILE, DEFAULT_MANIFEST_FILE, DEFAULT_SETTINGS_FILE};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "modspace", version)]
#[command(
    about = "Keep a multi-module Gradle workspace in line with its settings",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Workspace root (defaults to the current directory)
    #[arg(short, long, env = "MODSPACE_ROOT", default_value = ".", global = true)]
    pub root: PathBuf,

    /// Workspace manifest, relative to the root
    #[arg(
        long,
        env = "MODSPACE_MANIFEST_FILE",
        default_value = DEFAULT_MANIFEST_FILE,
        global = true
    )]
    pub manifest_file: String,

    /// Build file name inside each module directory
    #[arg(
        long,
        env = "MODSPACE_BUILD_FILE",
        default_value = DEFAULT_BUILD_FILE,
        global = true
    )]
    pub build_file: String,

    /// Settings file name
    #[arg(
        long,
        env = "MODSPACE_SETTINGS_FILE",
        default_value = DEFAULT_SETTINGS_FILE,
        global = true
    )]
    pub settings_file: String,

    /// Append logs to this file instead of stderr
    #[arg(long, env = "MODSPACE_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create an empty workspace manifest
    Init {
        /// Workspace name
        name: String,
    },
    /// Show manifest modules and whether they are included, without rewriting files
    Status,
    /// Re-read every file and rewrite declarations that disagree with the settings
    Refresh,
    /// Pull a manifest module into the workspace as source
    Include {
        /// Module name from the manifest
        module: String,
    },
    /// Drop a manifest module from the workspace
    Exclude {
        /// Module name from the manifest
        module: String,
    },
    /// Refresh repeatedly until interrupted
    Watch {
        /// Seconds between refreshes
        #[arg(long, default_value_t = 2)]
        interval_secs: u64,
    },
}

impl Cli {
    pub fn config(&self) -> ModspaceConfig {
        ModspaceConfig {
            manifest_file: self.manifest_file.clone(),
            build_file: self.build_file.clone(),
            settings_file: self.settings_file.clone(),
        }
    }
}
