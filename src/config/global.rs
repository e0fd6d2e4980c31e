//! Global configuration for templar.
//!
//! User-wide settings live in `~/.templar/config.toml`. Every setting has a
//! default, so a missing file is the same as an empty one.
//!
//! # File Format
//!
//! ```toml
//! # Where base templates referenced by URL are looked up
//! templates_dir = "~/.templar/templates"
//!
//! # Write .templar-replay.json into generated projects
//! save_replay = true
//!
//! [working_copy]
//! prefix = "templar"
//! ignore = ["__pycache__", "*.pyc", "venv", ".venv"]
//!
//! [abbreviations]
//! corp = "https://git.example.com/templates/{0}.git"
//! ```
//!
//! # Location
//!
//! In order of precedence:
//! 1. the path given with `--config`
//! 2. the `TEMPLAR_CONFIG` environment variable
//! 3. `~/.templar/config.toml` (`%LOCALAPPDATA%\templar\config.toml` on Windows)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_ENV_VAR, DEFAULT_WORKING_COPY_IGNORE, WORKING_COPY_PREFIX};
use crate::core::TemplarError;
use crate::source::LocalRepositoryResolver;
use crate::template::WorkingCopyOptions;

fn default_templates_dir() -> String {
    "~/.templar/templates".to_string()
}

const fn default_save_replay() -> bool {
    true
}

/// Global configuration structure for templar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Directory holding materialized template repositories.
    ///
    /// `~` and environment variables are expanded, see [`GlobalConfig::templates_dir`].
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Write the answers of generated projects to their replay file.
    #[serde(default = "default_save_replay")]
    pub save_replay: bool,

    /// How root templates are copied before their definitions are merged.
    #[serde(default, skip_serializing_if = "WorkingCopyConfig::is_default")]
    pub working_copy: WorkingCopyConfig,

    /// Extra locator abbreviations, on top of `gh`, `gl` and `bb`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub abbreviations: BTreeMap<String, String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            save_replay: default_save_replay(),
            working_copy: WorkingCopyConfig::default(),
            abbreviations: BTreeMap::new(),
        }
    }
}

/// `[working_copy]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingCopyConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

fn default_prefix() -> String {
    WORKING_COPY_PREFIX.to_string()
}

fn default_ignore() -> Vec<String> {
    DEFAULT_WORKING_COPY_IGNORE.iter().map(|s| (*s).to_string()).collect()
}

impl Default for WorkingCopyConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            ignore: default_ignore(),
        }
    }
}

impl WorkingCopyConfig {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn to_options(&self) -> WorkingCopyOptions {
        WorkingCopyOptions {
            prefix: self.prefix.clone(),
            ignore: self.ignore.clone(),
        }
    }
}

impl GlobalConfig {
    /// Load the configuration from the location given by [`Self::resolve_path`].
    ///
    /// Returns the default configuration when the file does not exist.
    pub fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load the configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_with_optional(None)
    }

    /// Load the configuration from `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid TOML for this structure.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content)
            .map_err(TemplarError::from)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))
    }

    /// Write the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(TemplarError::from)
            .context("Failed to serialize global config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write global config to {}", path.display()))?;
        Ok(())
    }

    /// The configuration file to use: `explicit`, then `$TEMPLAR_CONFIG`, then
    /// [`Self::default_path`].
    pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path);
        }
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Self::default_path(),
        }
    }

    /// Platform default location of the configuration file.
    ///
    /// - **Windows**: `%LOCALAPPDATA%\templar\config.toml`
    /// - **Unix/macOS**: `~/.templar/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| TemplarError::ConfigError {
                    message: "Unable to determine local data directory".to_string(),
                })?
                .join("templar")
        } else {
            dirs::home_dir()
                .ok_or_else(|| TemplarError::ConfigError {
                    message: "Unable to determine home directory".to_string(),
                })?
                .join(".templar")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// [`Self::templates_dir`] with `~` and environment variables expanded.
    pub fn templates_dir(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.templates_dir).map_err(|e| {
            TemplarError::ConfigError {
                message: format!("Cannot expand templates_dir '{}': {e}", self.templates_dir),
            }
        })?;
        Ok(PathBuf::from(expanded.as_ref()))
    }

    /// Repository resolver honoring the configured abbreviations.
    pub fn repository_resolver(&self) -> LocalRepositoryResolver {
        LocalRepositoryResolver::with_abbreviations(self.abbreviations.clone())
    }

    /// Configuration written by `templar config init`.
    #[must_use]
    pub fn init_example() -> Self {
        let mut abbreviations = BTreeMap::new();
        abbreviations.insert(
            "corp".to_string(),
            "https://git.example.com/templates/{0}.git".to_string(),
        );
        Self {
            abbreviations,
            ..Self::default()
        }
    }
}
