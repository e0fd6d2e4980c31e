//! Host generation pipeline interface.
//!
//! templar does not render templates itself. A host pipeline does, and calls
//! back into templar at fixed points of each generation through
//! [`GenerationHooks`]:
//!
//! ```text
//! generate(request, hooks)
//!   ├── hooks.pre_prompt(template_dir)       -> directory to read definitions from
//!   ├── prompt for values                    (Prompter)
//!   ├── hooks.pre_generate(self, project, values)
//!   │      └── base templates are generated here, re-entering generate()
//!   ├── hooks.environment(template_dir)      -> search paths and extensions
//!   ├── render files
//!   └── hooks.post_generate(project, values)
//! ```
//!
//! The [`Session`](crate::session::Session) implements [`GenerationHooks`]. The
//! pipeline passes itself to `pre_generate` so base templates can be generated
//! through the same pipeline without any global state.

use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::fields::{FieldDefinitions, FieldValues, is_private_key};
use crate::session::TemplateEnvironment;

/// Flags controlling one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Use prefilled values and defaults without asking the user.
    pub no_input: bool,
    /// Write into an existing project directory.
    pub overwrite_if_exists: bool,
    /// Run the template's own pre/post generation hooks.
    pub accept_hooks: bool,
    /// Keep files that already exist instead of overwriting them.
    pub skip_if_file_exists: bool,
}

impl GenerationOptions {
    /// Options used to expand a base template under its child's project.
    ///
    /// Bases are generated without prompting, over the same project directory,
    /// so later templates overwrite the files of earlier ones.
    pub fn for_base() -> Self {
        Self {
            no_input: true,
            overwrite_if_exists: true,
            accept_hooks: true,
            skip_if_file_exists: false,
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            no_input: false,
            overwrite_if_exists: false,
            accept_hooks: true,
            skip_if_file_exists: false,
        }
    }
}

/// One call into the host pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub template_dir: PathBuf,
    /// Answers known in advance; they are not asked again.
    pub prefilled: FieldValues,
    /// Parent directory of the generated project.
    pub output_dir: PathBuf,
    pub options: GenerationOptions,
}

/// Callbacks the host pipeline invokes during a generation.
pub trait GenerationHooks {
    /// Called before the definitions of `template_dir` are read.
    ///
    /// Returns the directory the pipeline must read `cookiecutter.json` from.
    fn pre_prompt(&mut self, template_dir: &Path) -> Result<PathBuf>;

    /// Called once values are known, before any file is rendered.
    fn pre_generate(
        &mut self,
        pipeline: &dyn GenerationPipeline,
        project_dir: &Path,
        values: &FieldValues,
    ) -> Result<()>;

    /// Called after the project files were written.
    fn post_generate(&mut self, _project_dir: &Path, _values: &FieldValues) -> Result<()> {
        Ok(())
    }

    /// Search paths and extensions to render `template_dir` with.
    fn environment(&mut self, template_dir: &Path) -> Result<TemplateEnvironment>;
}

/// A host able to render a template into a project directory.
pub trait GenerationPipeline {
    /// Generate `request.template_dir` under `request.output_dir`.
    ///
    /// Returns the generated project directory.
    fn generate(&self, request: &GenerationRequest, hooks: &mut dyn GenerationHooks)
    -> Result<PathBuf>;
}

/// Turns field definitions into filled values.
pub trait Prompter {
    fn prompt(&self, definitions: &FieldDefinitions, prefilled: &FieldValues) -> Result<FieldValues>;
}

/// Non-interactive prompter answering every field with its default.
///
/// - prefilled values win over defaults
/// - a list default answers with its first choice
/// - private keys are copied unchanged
/// - prefilled keys the template does not define are ignored
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultsPrompter;

impl Prompter for DefaultsPrompter {
    fn prompt(&self, definitions: &FieldDefinitions, prefilled: &FieldValues) -> Result<FieldValues> {
        let mut values = FieldValues::new();
        for (key, default) in definitions.entries() {
            let value = if is_private_key(key) {
                default.clone()
            } else if let Some(given) = prefilled.get(key.as_str()) {
                given.clone()
            } else {
                match default {
                    Value::Array(choices) => choices.first().cloned().unwrap_or(Value::Null),
                    other => other.clone(),
                }
            };
            values.insert(key.clone(), value);
        }
        Ok(values)
    }
}
