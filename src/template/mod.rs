//! Template records
//!
//! A [`TemplateRecord`] ties together where a template came from (its
//! locator), where it lives on disk, and the field definitions read from its
//! `cookiecutter.json`.
//!
//! # Identity
//!
//! Templates are identified by the final component of their resolved
//! directory ([`TemplateId`]), not by the full path or the locator. This lets
//! the root template be moved into a private working copy (which keeps the
//! directory name) without changing its identity. The price is that two
//! different templates whose directories share a name cannot appear in the
//! same inheritance hierarchy: the resolver reports the second one as
//! circular. Template names must be unique within one session.
//!
//! # Examples
//!
//! ```rust,no_run
//! use templar_cli::template::TemplateRecord;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let record = TemplateRecord::load(Path::new("templates/python-lib"))?;
//! assert_eq!(record.id().as_str(), "python-lib");
//! for key in record.fields().public_keys() {
//!     println!("{key}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod working_copy;

pub use working_copy::{WorkingCopy, WorkingCopyOptions, copy_template};

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::DEFINITION_FILE;
use crate::core::TemplarError;
use crate::fields::FieldDefinitions;
use crate::source::RepositoryResolver;

/// Identity of a template: the name of its directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    /// Identity of the template stored in `directory`.
    ///
    /// Paths without a final component (`.`, `..`) are canonicalized first.
    pub fn from_dir(directory: &Path) -> Result<Self> {
        if let Some(name) = directory.file_name() {
            return Ok(Self(name.to_string_lossy().into_owned()));
        }
        let canonical = directory
            .canonicalize()
            .with_context(|| format!("Failed to resolve template directory: {}", directory.display()))?;
        canonical
            .file_name()
            .map(|name| Self(name.to_string_lossy().into_owned()))
            .ok_or_else(|| {
                TemplarError::TemplateNotFound {
                    locator: directory.display().to_string(),
                    reason: "the path has no directory name".to_string(),
                }
                .into()
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// One template: locator, resolved directory and field definitions.
///
/// Equality compares identities only.
#[derive(Debug, Clone)]
pub struct TemplateRecord {
    id: TemplateId,
    locator: String,
    directory: PathBuf,
    fields: FieldDefinitions,
}

impl TemplateRecord {
    /// Load the template stored in `directory`.
    ///
    /// The locator defaults to the directory itself.
    ///
    /// # Errors
    ///
    /// - [`TemplarError::DefinitionNotFound`] if `cookiecutter.json` is missing
    /// - [`TemplarError::MalformedDefinition`] if it is not a JSON object
    pub fn load(directory: &Path) -> Result<Self> {
        Self::load_with_locator(directory, directory.display().to_string())
    }

    fn load_with_locator(directory: &Path, locator: String) -> Result<Self> {
        let id = TemplateId::from_dir(directory)?;
        let fields = read_definitions(directory)?;
        Ok(Self {
            id,
            locator,
            directory: directory.to_path_buf(),
            fields,
        })
    }

    /// Materialize `locator` through `resolver` and load it.
    pub fn from_locator(
        locator: &str,
        resolver: &dyn RepositoryResolver,
        clone_to_dir: &Path,
    ) -> Result<Self> {
        let resolved = resolver.resolve(locator, clone_to_dir)?;
        debug!("Resolved template '{}' to {}", locator, resolved.directory.display());
        Self::load_with_locator(&resolved.directory, locator.to_string())
    }

    /// Re-read the definitions from disk, discarding in-memory changes.
    pub fn reload(&mut self) -> Result<()> {
        self.fields = read_definitions(&self.directory)?;
        Ok(())
    }

    /// Write the definitions to `<directory>/cookiecutter.json`.
    pub fn save(&self) -> Result<()> {
        let path = self.definition_path();
        let content = self.fields.to_json_string()?;
        fs::write(&path, content).map_err(|e| {
            anyhow::Error::new(e).context(TemplarError::FileSystemError {
                operation: "write".to_string(),
                path: path.display().to_string(),
            })
        })?;
        Ok(())
    }

    /// Point the record at another copy of the same template.
    ///
    /// # Errors
    ///
    /// Fails when `directory` has a different name, since that would change
    /// the record's identity.
    pub fn relocate(&mut self, directory: &Path) -> Result<()> {
        let id = TemplateId::from_dir(directory)?;
        if id != self.id {
            return Err(TemplarError::Other {
                message: format!(
                    "Cannot move template '{}' to {}: the directory name must stay '{}'",
                    self.id,
                    directory.display(),
                    self.id
                ),
            }
            .into());
        }
        self.directory = directory.to_path_buf();
        Ok(())
    }

    pub fn id(&self) -> &TemplateId {
        &self.id
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn definition_path(&self) -> PathBuf {
        self.directory.join(DEFINITION_FILE)
    }

    pub fn fields(&self) -> &FieldDefinitions {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldDefinitions {
        &mut self.fields
    }
}

impl PartialEq for TemplateRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TemplateRecord {}

fn read_definitions(directory: &Path) -> Result<FieldDefinitions> {
    let path = directory.join(DEFINITION_FILE);
    if !path.is_file() {
        return Err(TemplarError::DefinitionNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read template definitions: {}", path.display()))?;
    Ok(FieldDefinitions::from_json_str(&content, &path.display().to_string())?)
}
