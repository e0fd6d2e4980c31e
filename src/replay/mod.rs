//! Stored answers of generated projects.
//!
//! After a successful generation the filled values are written to
//! `.templar-replay.json` inside the project, in prompt order. They can be read
//! back to inspect how a project was generated or to feed a later generation
//! as prefilled answers.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::REPLAY_FILE;
use crate::core::TemplarError;
use crate::fields::FieldValues;

/// Location of the replay file of `project_dir`.
pub fn replay_path(project_dir: &Path) -> PathBuf {
    project_dir.join(REPLAY_FILE)
}

/// Write `values` to the replay file of `project_dir`.
pub fn save_replay(project_dir: &Path, values: &FieldValues) -> Result<PathBuf> {
    let path = replay_path(project_dir);
    let mut content = serde_json::to_string_pretty(values)?;
    content.push('\n');
    fs::write(&path, content)
        .with_context(|| format!("Failed to write replay file: {}", path.display()))?;
    debug!("Saved {} answers to {}", values.len(), path.display());
    Ok(path)
}

/// Read the replay file of `project_dir`.
///
/// # Errors
///
/// [`TemplarError::ReplayNotFound`] when the project has no replay file.
pub fn load_replay(project_dir: &Path) -> Result<FieldValues> {
    let path = replay_path(project_dir);
    if !path.is_file() {
        return Err(TemplarError::ReplayNotFound {
            path: project_dir.display().to_string(),
        }
        .into());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read replay file: {}", path.display()))?;
    let values = serde_json::from_str(&content).map_err(|e| TemplarError::MalformedDefinition {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(values)
}
