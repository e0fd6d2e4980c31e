//! Helpers shared by the template commands.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::GlobalConfig;
use crate::session::{Session, SessionOptions};
use crate::source::RepositoryResolver;

/// A root template located on disk, with the settings to open a session on it.
pub struct TemplateContext {
    pub directory: PathBuf,
    pub options: SessionOptions,
    repositories: Box<dyn RepositoryResolver>,
}

impl TemplateContext {
    /// Resolve `locator` the same way base locators are resolved.
    pub fn resolve(locator: &str, config: &GlobalConfig) -> Result<Self> {
        let options = SessionOptions::from_config(config)?;
        let repositories = config.repository_resolver();
        let resolved = repositories
            .resolve(locator, &options.clone_to_dir)
            .with_context(|| format!("Cannot locate template '{locator}'"))?;

        Ok(Self {
            directory: resolved.directory,
            options,
            repositories: Box::new(repositories),
        })
    }

    pub fn repositories(&self) -> &dyn RepositoryResolver {
        &*self.repositories
    }

    /// Open a session on the template and resolve its bases.
    pub fn prepared_session(self) -> Result<Session> {
        let mut session = Session::new(&self.directory, self.repositories, self.options)?;
        session.prepare()?;
        Ok(session)
    }

    /// Resolve the bases of a private copy of the template in `work_dir`.
    ///
    /// The merged definitions are written into `work_dir` itself.
    pub fn prepared_session_in(self, work_dir: &Path) -> Result<Session> {
        let mut session = Session::with_work_dir(work_dir, self.repositories, self.options)?;
        session.prepare()?;
        Ok(session)
    }
}
