//! Subcommand implementations

pub mod check;
pub mod completions;
pub mod resolve;
pub mod targets;
