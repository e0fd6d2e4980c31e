//! Manage the global templar configuration.
//!
//! ```bash
//! templar config            # same as `config show`
//! templar config show
//! templar config path
//! templar config init [--force]
//! ```
//!
//! See [`crate::config`] for the file format and its location.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::GlobalConfig;

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommands {
    /// Create a config file with example settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Print the location of the config file
    Path,
}

impl ConfigCommand {
    pub fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        match self.command {
            Some(ConfigSubcommands::Init {
                force,
            }) => Self::init(force, config_path),
            Some(ConfigSubcommands::Show) | None => Self::show(config_path),
            Some(ConfigSubcommands::Path) => Self::show_path(config_path),
        }
    }

    fn init(force: bool, config_path: Option<PathBuf>) -> Result<()> {
        let config_path = GlobalConfig::resolve_path(config_path)?;

        if config_path.exists() && !force {
            println!("❌ Global config already exists at: {}", config_path.display());
            println!("   Use --force to overwrite");
            return Ok(());
        }

        let config = GlobalConfig::init_example();
        config.save_to(&config_path)?;

        println!("✅ Created global config at: {}", config_path.display());
        println!("\n{}", "Example configuration:".bold());
        println!("{}", toml::to_string_pretty(&config)?);
        println!("{}", "Next steps:".yellow());
        println!("  1. Point templates_dir at the directory holding your base templates");
        println!("  2. Replace the 'corp' abbreviation with your own template hosts");

        Ok(())
    }

    fn show(config_path: Option<PathBuf>) -> Result<()> {
        let path = GlobalConfig::resolve_path(config_path)?;
        let config = GlobalConfig::load_with_optional(Some(path.clone()))?;

        println!("{}", "Global Configuration".bold());
        if path.exists() {
            println!("Location: {}\n", path.display());
        } else {
            println!("Location: {} {}\n", path.display(), "(not created, using defaults)".dimmed());
        }
        println!("{}", toml::to_string_pretty(&config)?);
        println!("Templates directory: {}", config.templates_dir()?.display());
        Ok(())
    }

    fn show_path(config_path: Option<PathBuf>) -> Result<()> {
        let path = GlobalConfig::resolve_path(config_path)?;
        println!("{}", path.display());
        if !path.exists() {
            println!("\n{}", "Note:".yellow());
            println!("  Config file does not exist yet. Run 'templar config init' to create it");
        }
        Ok(())
    }
}
