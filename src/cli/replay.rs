//! Print the answers stored in a generated project.
//!
//! ```bash
//! templar replay ./my-project
//! templar replay ./my-project --format json
//! ```

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;

use crate::fields::is_private_key;
use crate::replay::{load_replay, replay_path};

#[derive(Args, Debug)]
pub struct ReplayCommand {
    /// Generated project directory
    #[arg(default_value = ".")]
    project: PathBuf,

    /// Output format: text or json
    #[arg(short = 'f', long, default_value = "text")]
    format: String,

    /// Include private (`_`-prefixed) values
    #[arg(long)]
    all: bool,
}

impl ReplayCommand {
    pub fn execute(self) -> Result<()> {
        if !matches!(self.format.as_str(), "text" | "json") {
            bail!("Invalid format '{}'. Valid formats are: text, json", self.format);
        }

        let values = load_replay(&self.project)?;
        let shown = values.iter().filter(|(key, _)| self.all || !is_private_key(key));

        if self.format == "json" {
            let object: serde_json::Map<String, Value> =
                shown.map(|(key, value)| (key.clone(), value.clone())).collect();
            println!("{}", serde_json::to_string_pretty(&object)?);
            return Ok(());
        }

        println!("{} {}", "Answers from".bold(), replay_path(&self.project).display());
        for (key, value) in shown {
            let rendered = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            println!("  {} = {}", key.cyan(), rendered);
        }
        Ok(())
    }
}
