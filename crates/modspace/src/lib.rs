//! Command-line front end for modspace.
//!
//! Argument parsing lives in [`cli`], command implementations in
//! [`commands`]. The binary only sets up logging and dispatches.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Command};
