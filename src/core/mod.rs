//! Core types for templar
//!
//! The error system shared by every module lives here:
//! - [`TemplarError`] - enumerated failure modes of template resolution and expansion
//! - [`ErrorContext`] - user-friendly wrapper with details and suggestions
//! - [`user_friendly_error`] - convert any [`anyhow::Error`] for CLI display
//!
//! # Error Handling Pattern
//!
//! ```rust
//! use templar_cli::core::{TemplarError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn load() -> Result<()> {
//!     Err(TemplarError::DefinitionNotFound {
//!         path: "cookiecutter.json".to_string(),
//!     }
//!     .into())
//! }
//!
//! if let Err(e) = load() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.suggestion.is_some());
//! }
//! ```

pub mod error;

pub use error::{ErrorContext, TemplarError, user_friendly_error};
