//! xenv - cross-target build environments
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Resolves the native packages and environment variables a cross build
//! needs for a target triple.
//!
//! # Registry lookup
//!
//! ```text
//! --registry / XENV_REGISTRY      explicit file
//! ./xenv.toml (or any parent)     project registry
//! $XENV_HOME/registry.toml        user registry (~/.xenv by default)
//! (embedded)                      built-in registry
//! ```

pub mod cmd;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "xenv")]
#[command(author, version = env!("XENV_VERSION"), about = "xenv - cross-target build environments")]
pub struct Cli {
    /// Registry file to use instead of the discovered one
    #[arg(long, global = true, env = "XENV_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Log resolution steps to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve packages and environment for one or more targets
    Resolve {
        /// Target triple (e.g. armv7-unknown-linux-gnueabihf)
        #[arg(short, long = "target", required = true)]
        targets: Vec<String>,
        /// Native library dependencies, comma separated (e.g. ssl,audio,dbus)
        #[arg(short, long, value_delimiter = ',')]
        deps: Vec<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List the targets the registry supports
    Targets,
    /// Validate every target and mapping in the registry
    Check,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Output format for `xenv resolve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `[packages]` and `[environment]` sections
    Text,
    /// JSON document
    Json,
    /// POSIX shell script
    Shell,
    /// Dockerfile instructions
    Dockerfile,
}

impl From<OutputFormat> for xenv_core::Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Self::Text,
            OutputFormat::Json => Self::Json,
            OutputFormat::Shell => Self::Shell,
            OutputFormat::Dockerfile => Self::Dockerfile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_deps_split_on_commas() {
        let cli = Cli::parse_from([
            "xenv",
            "resolve",
            "--target",
            "armv7-unknown-linux-gnueabihf",
            "--deps",
            "ssl,audio,dbus",
        ]);
        match cli.command {
            Commands::Resolve {
                targets,
                deps,
                format,
            } => {
                assert_eq!(targets, vec!["armv7-unknown-linux-gnueabihf"]);
                assert_eq!(deps, vec!["ssl", "audio", "dbus"]);
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_format_maps_to_core() {
        assert_eq!(
            xenv_core::Format::from(OutputFormat::Dockerfile),
            xenv_core::Format::Dockerfile
        );
    }
}
