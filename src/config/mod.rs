//! Configuration management for templar
//!
//! templar reads a single, optional, user-wide configuration file. It controls
//! where base templates referenced by URL are looked up, how root templates are
//! copied before their definitions are merged, which locator abbreviations are
//! known, and whether generated projects get a replay file.
//!
//! # Modules
//!
//! - `global` - the `config.toml` structure, its location and persistence
//!
//! # Precedence
//!
//! 1. `--config <FILE>` on the command line
//! 2. `TEMPLAR_CONFIG` environment variable
//! 3. `~/.templar/config.toml`
//! 4. built-in defaults when no file exists
//!
//! Template definitions themselves (`cookiecutter.json`) are not configuration;
//! see [`crate::fields`].

mod global;

pub use global::{GlobalConfig, WorkingCopyConfig};
