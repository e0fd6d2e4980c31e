//! Template hierarchies on disk.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::constants::DEFINITION_FILE;
use crate::fields::FieldDefinitions;
use crate::session::{Session, SessionOptions};
use crate::source::LocalRepositoryResolver;

/// A temporary directory holding sibling templates.
///
/// The directory doubles as the templates directory of sessions opened with
/// [`TemplateFixture::session`], so `_bases` entries can name siblings
/// directly (`"core"`).
pub struct TemplateFixture {
    temp_dir: TempDir,
}

impl TemplateFixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new().context("Failed to create fixture directory")?,
        })
    }

    /// Directory holding the templates.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Directory of template `name`.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Create template `name` with `definitions` as its `cookiecutter.json`.
    ///
    /// Key order of `definitions` is kept.
    pub fn template(&self, name: &str, definitions: Value) -> Result<PathBuf> {
        let directory = self.path(name);
        fs::create_dir_all(&directory)
            .with_context(|| format!("Failed to create template {}", directory.display()))?;
        let content = serde_json::to_string_pretty(&definitions)?;
        fs::write(directory.join(DEFINITION_FILE), content)?;
        Ok(directory)
    }

    /// Write a file to render into template `name`.
    pub fn file(&self, name: &str, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.path(name).join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Raw definition file of template `name`.
    pub fn definition_text(&self, name: &str) -> Result<String> {
        let path = self.path(name).join(DEFINITION_FILE);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Parsed definitions of the template in `directory`.
    pub fn definitions_at(directory: &Path) -> Result<FieldDefinitions> {
        let path = directory.join(DEFINITION_FILE);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(FieldDefinitions::from_json_str(&content, &path.display().to_string())?)
    }

    /// Session options using the fixture as templates directory.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::new(self.root())
    }

    /// Open a session on template `name`.
    pub fn session(&self, name: &str) -> Result<Session> {
        Session::new(
            &self.path(name),
            Box::new(LocalRepositoryResolver::new()),
            self.session_options(),
        )
    }
}
