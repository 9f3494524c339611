//! Tooling & Integration Layer
//!
//! Command-line access to collections: import, export, inspection, copies, and
//! the evaluation view.

pub mod cli;

pub use cli::{Cli, CliContext, CommandOutput, Commands};
