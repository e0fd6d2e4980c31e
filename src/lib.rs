//! templar - template inheritance for project scaffolding
//!
//! A scaffold template (a directory with a `cookiecutter.json` field-definition
//! file and the files to render) may declare base templates it extends:
//!
//! ```json
//! {
//!   "project_name": "demo",
//!   "_bases": ["gh:acme/python-lib", "../ci"]
//! }
//! ```
//!
//! templar resolves the whole hierarchy before the user is prompted, merges
//! the definitions of every base into the template in a deterministic order,
//! rejects cyclic hierarchies, and expands every base into the project
//! directory before the template itself is rendered on top.
//!
//! # Architecture Overview
//!
//! - The **resolver** walks the bases depth first and builds the template
//!   resolution order (TRO): every base appears after all of its own bases.
//! - The **field merge** folds each base's definitions into its child. Child
//!   values win and keep their position; keys new to the child are inserted
//!   next to the last key the base shares with it.
//! - The **expansion orchestrator** renders every base, in TRO order, into the
//!   project directory, forwarding the public answers of the root.
//! - The rendering engine and the prompting of the user are collaborators
//!   behind the [`pipeline`] traits; a [`session::Session`] plugs into them
//!   through [`pipeline::GenerationHooks`].
//!
//! # Core Modules
//!
//! ## Templates and definitions
//! - [`fields`] - field-definition mappings, the ordered map and the merge
//! - [`template`] - template identity, records and working copies
//! - [`source`] - locators to local directories
//!
//! ## Resolution and expansion
//! - [`resolver`] - resolution order, cycle detection, inheritance graph
//! - [`installer`] - expansion of base templates
//! - [`session`] - per-generation state and the host hooks
//! - [`pipeline`] - interfaces of the rendering host
//! - [`replay`] - stored answers of generated projects
//!
//! ## Supporting modules
//! - [`cli`] - command-line interface
//! - [`config`] - global configuration (`~/.templar/config.toml`)
//! - [`core`] - error types and user-facing error reporting
//! - [`constants`] - file names and defaults
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Show the resolution order and the merged definitions
//! templar resolve ./templates/python-app
//!
//! # Show the inheritance tree
//! templar tree ./templates/python-app
//!
//! # Write a copy of the template with merged definitions
//! templar merge ./templates/python-app --output ./build
//!
//! # Show the answers a project was generated with
//! templar replay ./my-project
//! ```

// Core functionality modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;

// Templates and definitions
pub mod fields;
pub mod source;
pub mod template;

// Resolution and expansion
pub mod installer;
pub mod pipeline;
pub mod replay;
pub mod resolver;
pub mod session;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
