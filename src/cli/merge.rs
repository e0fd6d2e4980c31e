//! Write a flattened copy of a template.
//!
//! ```bash
//! templar merge ./templates/python-app --output ./build
//! ```
//!
//! The copy lands in `<output>/<template name>`. Its `cookiecutter.json`
//! holds the merged definitions of the whole hierarchy, in resolution order,
//! with `_copy_without_render` and `__prompts__` combined. The files of the
//! bases are not copied; they are contributed when the bases are expanded.

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use super::common::TemplateContext;
use crate::config::GlobalConfig;
use crate::template::{TemplateId, copy_template};

#[derive(Args, Debug)]
pub struct MergeCommand {
    /// Template directory or locator
    template: String,

    /// Directory the merged template is written into
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Replace an existing copy
    #[arg(long)]
    force: bool,
}

impl MergeCommand {
    pub fn execute(self, config: &GlobalConfig) -> Result<()> {
        let context = TemplateContext::resolve(&self.template, config)?;
        let id = TemplateId::from_dir(&context.directory)?;
        let destination = self.output.join(id.as_str());

        if destination.exists() {
            if !self.force {
                bail!(
                    "{} already exists. Use --force to replace it",
                    destination.display()
                );
            }
            fs::remove_dir_all(&destination).with_context(|| {
                format!("Failed to remove existing copy: {}", destination.display())
            })?;
        }

        let copied = copy_template(&context.directory, &destination, &context.options.working_copy)?;
        let session = match context.prepared_session_in(&destination) {
            Ok(session) => session,
            Err(e) => {
                // leave no half-merged template behind
                if let Err(cleanup) = fs::remove_dir_all(&destination) {
                    warn!("Failed to remove {}: {cleanup}", destination.display());
                }
                return Err(e);
            }
        };

        let bases = session.bases().count();
        println!(
            "✅ Wrote {} ({} file(s), {} base template(s) merged)",
            destination.display().to_string().green(),
            copied,
            bases
        );
        Ok(())
    }
}
