//! A generation host for tests.

use anyhow::{Result, bail};
use serde_json::Value;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::constants::DEFINITION_FILE;
use crate::pipeline::{
    DefaultsPrompter, GenerationHooks, GenerationPipeline, GenerationRequest, Prompter,
};
use crate::session::TemplateEnvironment;
use crate::template::TemplateRecord;

/// Pipeline that copies template files verbatim and records what it did.
///
/// Each generation runs the hooks in host order: `pre_prompt`, prompting with
/// [`DefaultsPrompter`], `pre_generate`, `environment`, file copy and
/// `post_generate`. The project directory is `output_dir/<project_slug>`,
/// or `output_dir/<template name>` when no `project_slug` value exists.
/// `cookiecutter.json` itself is not copied.
#[derive(Debug, Default)]
pub struct RecordingPipeline {
    requests: RefCell<Vec<GenerationRequest>>,
    environments: RefCell<Vec<(PathBuf, TemplateEnvironment)>>,
    generated: RefCell<Vec<PathBuf>>,
}

impl RecordingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request received, nested ones included, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.borrow().clone()
    }

    /// Template directories requested, in call order.
    pub fn requested_templates(&self) -> Vec<PathBuf> {
        self.requests.borrow().iter().map(|r| r.template_dir.clone()).collect()
    }

    /// Environment handed out for each rendered template directory.
    pub fn environments(&self) -> Vec<(PathBuf, TemplateEnvironment)> {
        self.environments.borrow().clone()
    }

    /// Project directories in completion order.
    pub fn generated(&self) -> Vec<PathBuf> {
        self.generated.borrow().clone()
    }
}

impl GenerationPipeline for RecordingPipeline {
    fn generate(
        &self,
        request: &GenerationRequest,
        hooks: &mut dyn GenerationHooks,
    ) -> Result<PathBuf> {
        self.requests.borrow_mut().push(request.clone());

        let template_dir = hooks.pre_prompt(&request.template_dir)?;
        let template = TemplateRecord::load(&template_dir)?;
        let values = DefaultsPrompter.prompt(template.fields(), &request.prefilled)?;

        let project_name = values
            .get("project_slug")
            .and_then(Value::as_str)
            .map_or_else(|| template.id().to_string(), str::to_string);
        let project_dir = request.output_dir.join(project_name);
        if project_dir.exists() && !request.options.overwrite_if_exists {
            bail!("Project directory {} already exists", project_dir.display());
        }

        hooks.pre_generate(self, &project_dir, &values)?;

        let environment = hooks.environment(&template_dir)?;
        self.environments.borrow_mut().push((template_dir.clone(), environment));

        copy_files(&template_dir, &project_dir, request.options.skip_if_file_exists)?;
        hooks.post_generate(&project_dir, &values)?;

        self.generated.borrow_mut().push(project_dir.clone());
        Ok(project_dir)
    }
}

fn copy_files(template_dir: &Path, project_dir: &Path, skip_existing: bool) -> Result<()> {
    fs::create_dir_all(project_dir)?;
    for entry in WalkDir::new(template_dir).min_depth(1) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(template_dir)?;
        if relative == Path::new(DEFINITION_FILE) {
            continue;
        }
        let target = project_dir.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if skip_existing && target.exists() {
                continue;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
