//! Generation sessions.
//!
//! A [`Session`] holds everything one generation of a root template needs:
//! the root [`TemplateRecord`], the inheritance resolver and its resolution
//! order, the expansion state, the private working copy and the templating
//! environments. Nothing is shared between sessions; independent generations
//! in one process each create their own.
//!
//! The session is the [`GenerationHooks`] implementation handed to the host
//! pipeline:
//!
//! | hook | what the session does |
//! |------|-----------------------|
//! | `pre_prompt` | resolves the root's bases and points the host at the merged working copy |
//! | `pre_generate` | expands the bases into the project's parent directory |
//! | `post_generate` | saves the root project's answers to its replay file |
//! | `environment` | returns the search paths and extensions of a template |
//!
//! # Example
//!
//! ```rust,no_run
//! use templar_cli::session::{Session, SessionOptions};
//! use templar_cli::source::LocalRepositoryResolver;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let options = SessionOptions::new("/home/me/.templar/templates");
//! let mut session = Session::new(
//!     Path::new("templates/python-app"),
//!     Box::new(LocalRepositoryResolver::new()),
//!     options,
//! )?;
//! session.prepare()?;
//! for base in session.bases() {
//!     println!("{} ({})", base.id(), base.locator());
//! }
//! # Ok(())
//! # }
//! ```

pub mod environment;
pub mod registry;

pub use environment::TemplateEnvironment;
pub use registry::Registry;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::GlobalConfig;
use crate::fields::FieldValues;
use crate::installer::{ExpansionHost, ExpansionStage, ExpansionState, ExpansionTarget, install_bases};
use crate::pipeline::{GenerationHooks, GenerationPipeline};
use crate::replay::save_replay;
use crate::resolver::{InheritanceResolver, ResolveContext};
use crate::source::RepositoryResolver;
use crate::template::{TemplateId, TemplateRecord, WorkingCopy, WorkingCopyOptions};

/// Settings of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Directory base locators are materialized in (and looked up relative to).
    pub clone_to_dir: PathBuf,
    pub working_copy: WorkingCopyOptions,
    /// Write the replay file of the generated root project.
    pub save_replay: bool,
}

impl SessionOptions {
    pub fn new(clone_to_dir: impl Into<PathBuf>) -> Self {
        Self {
            clone_to_dir: clone_to_dir.into(),
            working_copy: WorkingCopyOptions::default(),
            save_replay: true,
        }
    }

    /// Options from the user's global configuration.
    pub fn from_config(config: &GlobalConfig) -> Result<Self> {
        Ok(Self {
            clone_to_dir: config.templates_dir()?,
            working_copy: config.working_copy.to_options(),
            save_replay: config.save_replay,
        })
    }
}

/// State of one generation of a root template and its bases.
pub struct Session {
    root: TemplateRecord,
    repositories: Box<dyn RepositoryResolver>,
    options: SessionOptions,
    resolver: InheritanceResolver,
    expansion: ExpansionState,
    working_copy: Option<WorkingCopy>,
    /// The root already lives in a private copy; no working copy is made.
    private_copy: bool,
    environments: Registry<TemplateId, TemplateEnvironment>,
}

impl Session {
    /// Session for the template in `template_dir`.
    pub fn new(
        template_dir: &Path,
        repositories: Box<dyn RepositoryResolver>,
        options: SessionOptions,
    ) -> Result<Self> {
        Self::build(template_dir, repositories, options, false)
    }

    /// Session for a template that was already copied to a private
    /// `work_dir`; merged definitions are written there directly.
    pub fn with_work_dir(
        work_dir: &Path,
        repositories: Box<dyn RepositoryResolver>,
        options: SessionOptions,
    ) -> Result<Self> {
        Self::build(work_dir, repositories, options, true)
    }

    fn build(
        template_dir: &Path,
        repositories: Box<dyn RepositoryResolver>,
        options: SessionOptions,
        private_copy: bool,
    ) -> Result<Self> {
        let root = TemplateRecord::load(template_dir)?;
        debug!("Starting session for template '{}'", root.id());
        Ok(Self {
            expansion: ExpansionState::new(root.id().clone()),
            root,
            repositories,
            options,
            resolver: InheritanceResolver::new(),
            working_copy: None,
            private_copy,
            environments: Registry::new(),
        })
    }

    /// Resolve the root's bases and write the merged definitions.
    ///
    /// Runs once; later calls return the first result without doing anything.
    /// Returns `true` when the root declares bases.
    pub fn prepare(&mut self) -> Result<bool> {
        let Self {
            root,
            repositories,
            options,
            resolver,
            working_copy,
            private_copy,
            ..
        } = self;

        let ctx = ResolveContext {
            repositories: &**repositories,
            clone_to_dir: &options.clone_to_dir,
        };
        let copy_options = &options.working_copy;
        let private = *private_copy;

        resolver.prepare(root, ctx, |dir| {
            if private {
                return Ok(dir.to_path_buf());
            }
            let copy = WorkingCopy::create(dir, copy_options)?;
            let directory = copy.directory().to_path_buf();
            *working_copy = Some(copy);
            Ok(directory)
        })
    }

    /// Expand the bases of the root under `output_dir`.
    ///
    /// See [`install_bases`] for the guard rules.
    pub fn install_bases(
        &mut self,
        pipeline: &dyn GenerationPipeline,
        output_dir: &Path,
        values: &FieldValues,
    ) -> Result<bool> {
        install_bases(self, pipeline, output_dir, values)
    }

    pub fn root(&self) -> &TemplateRecord {
        &self.root
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn resolver(&self) -> &InheritanceResolver {
        &self.resolver
    }

    /// Base templates in expansion order.
    pub fn bases(&self) -> impl Iterator<Item = &TemplateRecord> {
        self.resolver.bases()
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Directory of the working copy, when one was created.
    pub fn working_copy_dir(&self) -> Option<&Path> {
        self.working_copy.as_ref().map(WorkingCopy::directory)
    }

    /// Environment registered for `id`, if it was requested or extended.
    pub fn environment_of(&self, id: &TemplateId) -> Option<&TemplateEnvironment> {
        self.environments.get(id)
    }

    fn is_root(&self, template_dir: &Path) -> Result<bool> {
        Ok(TemplateId::from_dir(template_dir)? == *self.root.id())
    }
}

impl GenerationHooks for Session {
    fn pre_prompt(&mut self, template_dir: &Path) -> Result<PathBuf> {
        if !self.is_root(template_dir)? {
            return Ok(template_dir.to_path_buf());
        }
        self.prepare()?;
        Ok(self.root.directory().to_path_buf())
    }

    fn pre_generate(
        &mut self,
        pipeline: &dyn GenerationPipeline,
        project_dir: &Path,
        values: &FieldValues,
    ) -> Result<()> {
        let output_dir = match project_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        self.install_bases(pipeline, output_dir, values)?;
        Ok(())
    }

    fn post_generate(&mut self, project_dir: &Path, values: &FieldValues) -> Result<()> {
        let generating_root = self.expansion.current() == self.root.id()
            && self.expansion.stage() != ExpansionStage::Expanding;
        if self.options.save_replay && generating_root {
            let path = save_replay(project_dir, values)?;
            info!("Saved answers to {}", path.display());
        }
        Ok(())
    }

    fn environment(&mut self, template_dir: &Path) -> Result<TemplateEnvironment> {
        let id = TemplateId::from_dir(template_dir)?;
        let environment = self
            .environments
            .get_or_try_create(id, || TemplateEnvironment::for_template(template_dir))?;
        Ok(environment.clone())
    }
}

impl ExpansionHost for Session {
    fn root_id(&self) -> &TemplateId {
        self.root.id()
    }

    fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    fn expansion_mut(&mut self) -> &mut ExpansionState {
        &mut self.expansion
    }

    fn expansion_targets(&self) -> Result<Vec<ExpansionTarget>> {
        self.resolver
            .bases()
            .map(|base| -> Result<ExpansionTarget> {
                Ok(ExpansionTarget {
                    id: base.id().clone(),
                    directory: base.directory().to_path_buf(),
                    extensions: base.fields().extensions()?,
                })
            })
            .collect()
    }

    fn bases_installed(&mut self, targets: &[ExpansionTarget]) -> Result<()> {
        let root_dir = self.root.directory().to_path_buf();
        let environment = self
            .environments
            .get_or_try_create(self.root.id().clone(), || TemplateEnvironment::for_template(&root_dir))?;
        for target in targets {
            environment.inherit(&target.directory, &target.extensions);
        }
        info!(
            "Updated templating environment of '{}': {} search path(s), {} extension(s)",
            self.root.id(),
            environment.search_paths.len(),
            environment.extensions.len()
        );
        Ok(())
    }
}
