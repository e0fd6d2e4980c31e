//! Command-line interface for templar.
//!
//! Each command lives in its own module with a clap `Args` struct and an
//! `execute` method. Commands that work on templates receive the loaded
//! [`GlobalConfig`]; `config` receives the configuration path instead so it can
//! create or display the file itself.
//!
//! # Available Commands
//!
//! - `resolve` - resolve a template's bases and print the merged definitions
//! - `tree` - print the inheritance tree of a template
//! - `merge` - write a copy of a template with its bases merged in
//! - `replay` - print the answers stored in a generated project
//! - `config` - show, locate or create the global configuration
//!
//! # Global Options
//!
//! - `--verbose` - debug logging
//! - `--quiet` - errors only
//! - `--config` - path to a custom config file
//!
//! `RUST_LOG` overrides the level picked by `--verbose`/`--quiet`.
//!
//! # Example
//!
//! ```bash
//! templar resolve ./templates/python-app
//! templar tree gh:acme/python-app
//! templar merge ./templates/python-app --output ./flattened
//! templar replay ./my-project --format json
//! ```

mod common;
mod config;
mod merge;
mod replay;
mod resolve;
mod tree;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::GlobalConfig;

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// `None` disables logging.
    pub log_level: Option<String>,
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Install the tracing subscriber, writing to stderr.
    ///
    /// `RUST_LOG` takes precedence over the configured level.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if let Some(level) = &self.log_level {
            EnvFilter::new(format!("templar_cli={level}"))
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .try_init();
    }
}

#[derive(Parser)]
#[command(
    name = "templar",
    about = "Template inheritance for project scaffolding",
    version,
    long_about = "templar resolves the base templates a scaffold template extends, merges their \
                  field definitions in a deterministic order and expands them before the template itself."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the global config file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a template's bases and print the merged field definitions
    Resolve(resolve::ResolveCommand),

    /// Print the inheritance tree of a template
    Tree(tree::TreeCommand),

    /// Write a copy of a template with the definitions of its bases merged in
    Merge(merge::MergeCommand),

    /// Print the answers stored in a generated project
    Replay(replay::ReplayCommand),

    /// Manage the global configuration
    Config(config::ConfigCommand),
}

impl Cli {
    /// Set up logging and run the selected command.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config)
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let load_global = || GlobalConfig::load_with_optional(config.config_path.clone());

        match self.command {
            Commands::Resolve(cmd) => cmd.execute(&load_global()?),
            Commands::Tree(cmd) => cmd.execute(&load_global()?),
            Commands::Merge(cmd) => cmd.execute(&load_global()?),
            Commands::Replay(cmd) => cmd.execute(),
            Commands::Config(cmd) => cmd.execute(config.config_path.clone()),
        }
    }
}
