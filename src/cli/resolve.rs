//! Resolve a template's bases and print the result.
//!
//! ```bash
//! templar resolve ./templates/python-app
//! templar resolve gh:acme/python-app --format json
//! ```
//!
//! The text format lists the resolution order (the order bases are expanded
//! in) followed by the merged `cookiecutter.json`. The JSON format prints one
//! object:
//!
//! ```json
//! {
//!   "template": "python-app",
//!   "resolution_order": [
//!     { "id": "core", "locator": "../core", "directory": "/templates/core" }
//!   ],
//!   "fields": { "project_name": "demo", "_bases": ["../core"] }
//! }
//! ```

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use serde_json::json;

use super::common::TemplateContext;
use crate::config::GlobalConfig;
use crate::session::Session;

#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Template directory or locator
    template: String,

    /// Output format: text or json
    #[arg(short = 'f', long, default_value = "text")]
    format: String,
}

impl ResolveCommand {
    pub fn execute(self, config: &GlobalConfig) -> Result<()> {
        self.validate_arguments()?;

        let session = TemplateContext::resolve(&self.template, config)?.prepared_session()?;
        match self.format.as_str() {
            "json" => Self::output_json(&session),
            _ => Self::output_text(&session),
        }
    }

    fn validate_arguments(&self) -> Result<()> {
        match self.format.as_str() {
            "text" | "json" => Ok(()),
            other => bail!("Invalid format '{other}'. Valid formats are: text, json"),
        }
    }

    fn output_json(session: &Session) -> Result<()> {
        let order: Vec<_> = session
            .bases()
            .map(|base| {
                json!({
                    "id": base.id(),
                    "locator": base.locator(),
                    "directory": base.directory().display().to_string(),
                })
            })
            .collect();
        let output = json!({
            "template": session.root().id(),
            "resolution_order": order,
            "fields": session.root().fields(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_text(session: &Session) -> Result<()> {
        let root = session.root();
        println!("{} {}", "Template:".bold(), root.id().to_string().cyan());

        let bases: Vec<_> = session.bases().collect();
        if bases.is_empty() {
            println!("No base templates.");
        } else {
            println!("\n{}", "Resolution order:".bold());
            for (index, base) in bases.iter().enumerate() {
                println!(
                    "  {}. {} {}",
                    index + 1,
                    base.id().to_string().green(),
                    format!("({})", base.locator()).dimmed()
                );
            }
        }

        println!("\n{}", "Merged definitions:".bold());
        print!("{}", root.fields().to_json_string()?);
        Ok(())
    }
}
