//! Templating environments.
//!
//! Each template is rendered with a list of search paths (where includes and
//! `extends` targets are looked up) and a list of templating extensions. A
//! template's own environment holds its directory, its `templates/`
//! sub-directory when present, and the extensions named in `_extensions`.
//!
//! Once its bases are expanded, the root's environment also receives every
//! base's `templates/` directory and extensions, so files of the root can
//! reuse snippets defined by a base.

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::constants::{DEFINITION_FILE, TEMPLATES_SUBDIR};
use crate::template::TemplateRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateEnvironment {
    /// Directories searched for included templates, in lookup order.
    pub search_paths: Vec<PathBuf>,
    /// Templating extensions to load.
    pub extensions: Vec<String>,
}

impl TemplateEnvironment {
    /// Environment of the template in `template_dir`.
    pub fn for_template(template_dir: &Path) -> Result<Self> {
        let mut environment = Self {
            search_paths: vec![template_dir.to_path_buf()],
            extensions: Vec::new(),
        };
        if let Some(shared) = shared_templates_dir(template_dir) {
            environment.search_paths.push(shared);
        }
        if template_dir.join(DEFINITION_FILE).is_file() {
            let record = TemplateRecord::load(template_dir)?;
            environment.extensions = record.fields().extensions()?;
        }
        Ok(environment)
    }

    /// Add what a base template shares: its `templates/` directory and its
    /// extensions. Entries already present are not repeated.
    pub fn inherit(&mut self, base_dir: &Path, extensions: &[String]) {
        if let Some(shared) = shared_templates_dir(base_dir) {
            if !self.search_paths.contains(&shared) {
                self.search_paths.push(shared);
            }
        }
        for extension in extensions {
            if !self.extensions.contains(extension) {
                self.extensions.push(extension.clone());
            }
        }
    }
}

fn shared_templates_dir(template_dir: &Path) -> Option<PathBuf> {
    let shared = template_dir.join(TEMPLATES_SUBDIR);
    shared.is_dir().then_some(shared)
}
