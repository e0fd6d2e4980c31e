//! Print the inheritance tree of a template.
//!
//! ```bash
//! templar tree ./templates/python-app
//! ```
//!
//! ```text
//! python-app
//! ├── python-lib
//! │   └── core
//! └── ci
//! ```
//!
//! Unlike `resolve`, the tree is built from the templates as they are on disk
//! and nothing is merged. A cyclic hierarchy is still printed, with the
//! repeated template marked, before the command fails.

use anyhow::Result;
use clap::Args;

use super::common::TemplateContext;
use crate::config::GlobalConfig;
use crate::resolver::InheritanceGraph;
use crate::template::TemplateRecord;

#[derive(Args, Debug)]
pub struct TreeCommand {
    /// Template directory or locator
    template: String,
}

impl TreeCommand {
    pub fn execute(self, config: &GlobalConfig) -> Result<()> {
        let context = TemplateContext::resolve(&self.template, config)?;
        let root = TemplateRecord::load(&context.directory)?;
        let graph = InheritanceGraph::discover(
            &root,
            context.repositories(),
            &context.options.clone_to_dir,
        )?;

        print!("{}", graph.to_tree_string(root.id()));
        graph.detect_cycles()
    }
}
