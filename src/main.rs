//! templar CLI entry point
//!
//! Parses the command line, runs the command and turns failures into
//! user-friendly messages on stderr with a non-zero exit code.
//!
//! - `resolve` - resolve a template's bases and print the merged definitions
//! - `tree` - print the inheritance tree of a template
//! - `merge` - write a copy of a template with merged definitions
//! - `replay` - print the answers stored in a generated project
//! - `config` - manage the global configuration

use anyhow::Result;
use clap::Parser;
use templar_cli::cli;
use templar_cli::core::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
