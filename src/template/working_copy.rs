//! Private working copy of a root template.
//!
//! Merging base definitions rewrites `cookiecutter.json`, which must never
//! happen in the user's template. The root template is therefore copied into a
//! temporary directory first, keeping its directory name so its
//! [`TemplateId`](super::TemplateId) is unchanged:
//!
//! ```text
//! /tmp/templar.a1b2c3/
//! └── python-lib/            <- working copy, same name as the original
//!     ├── cookiecutter.json  <- rewritten with the merged definitions
//!     └── {{cookiecutter.project_slug}}/
//! ```
//!
//! The temporary directory is removed when the [`WorkingCopy`] is dropped.
//! Removal is best effort: a failure is ignored.

use anyhow::{Context, Result};
use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::constants::{DEFAULT_WORKING_COPY_IGNORE, WORKING_COPY_PREFIX};
use crate::core::TemplarError;

/// How working copies are created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopyOptions {
    /// Prefix of the temporary directory name.
    pub prefix: String,
    /// Glob patterns matched against each file or directory name; matches are
    /// not copied (directories are skipped with their content).
    pub ignore: Vec<String>,
}

impl Default for WorkingCopyOptions {
    fn default() -> Self {
        Self {
            prefix: WORKING_COPY_PREFIX.to_string(),
            ignore: DEFAULT_WORKING_COPY_IGNORE.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl WorkingCopyOptions {
    fn ignore_patterns(&self) -> Result<Vec<Pattern>, TemplarError> {
        self.ignore
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| TemplarError::ConfigError {
                    message: format!("Invalid working-copy ignore pattern '{p}': {e}"),
                })
            })
            .collect()
    }
}

/// A template tree copied into a temporary directory.
#[derive(Debug)]
pub struct WorkingCopy {
    root: TempDir,
    directory: PathBuf,
}

impl WorkingCopy {
    /// Copy `source` into a new temporary directory.
    pub fn create(source: &Path, options: &WorkingCopyOptions) -> Result<Self> {
        let source = source
            .canonicalize()
            .with_context(|| format!("Failed to resolve template directory: {}", source.display()))?;
        let name = source.file_name().ok_or_else(|| TemplarError::FileSystemError {
            operation: "copy template".to_string(),
            path: source.display().to_string(),
        })?;

        let patterns = options.ignore_patterns()?;

        let root = tempfile::Builder::new()
            .prefix(&options.prefix)
            .tempdir()
            .context("Failed to create working-copy directory")?;
        let directory = root.path().join(name);

        info!("Copying template from {} to {}", source.display(), directory.display());
        let copied = copy_tree(&source, &directory, &patterns)?;
        debug!("Copied {} files into working copy", copied);

        Ok(Self {
            root,
            directory,
        })
    }

    /// Directory of the copied template.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Temporary directory holding the copy.
    pub fn root(&self) -> &Path {
        self.root.path()
    }
}

/// Copy the template tree `source` into `destination`, skipping the names
/// matched by `options.ignore`. Returns the number of files copied.
pub fn copy_template(source: &Path, destination: &Path, options: &WorkingCopyOptions) -> Result<usize> {
    let patterns = options.ignore_patterns()?;
    copy_tree(source, destination, &patterns)
}

fn is_ignored(name: &str, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|p| p.matches(name))
}

fn copy_tree(src: &Path, dst: &Path, ignore: &[Pattern]) -> Result<usize> {
    let mut copied = 0;
    let walker = WalkDir::new(src)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !is_ignored(&entry.file_name().to_string_lossy(), ignore)
        });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to read template tree: {}", src.display()))?;
        let relative = entry.path().strip_prefix(src).with_context(|| {
            format!("Unexpected path outside template: {}", entry.path().display())
        })?;
        let target = dst.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory: {}", target.display()))?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy file from {} to {}", entry.path().display(), target.display())
            })?;
            copied += 1;
        }
        // Symlinks are not copied
    }

    Ok(copied)
}
