//! Error handling for templar
//!
//! This module provides the error type shared by every templar module and the
//! user-facing error reporting used by the CLI. The error system follows two rules:
//! 1. **Strongly-typed errors** ([`TemplarError`]) so callers and tests can match
//!    on the failure that actually happened
//! 2. **User-friendly messages** ([`ErrorContext`]) with a suggestion for CLI users
//!
//! Library functions return [`anyhow::Result`] and put a [`TemplarError`] inside,
//! so the typed error survives any `.context(...)` added on the way up and can be
//! recovered with [`anyhow::Error::downcast_ref`].
//!
//! # Error Categories
//!
//! - **Inheritance**: [`TemplarError::CircularInheritance`]
//! - **Field definitions**: [`TemplarError::DefinitionNotFound`],
//!   [`TemplarError::MalformedDefinition`]
//! - **Field ordering contract**: [`TemplarError::KeyNotFound`], [`TemplarError::EmptyMapping`]
//! - **Sources**: [`TemplarError::TemplateNotFound`]
//! - **Projects**: [`TemplarError::ReplayNotFound`]
//! - **Environment**: [`TemplarError::FileSystemError`], [`TemplarError::ConfigError`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use templar_cli::core::{TemplarError, user_friendly_error};
//!
//! let error = anyhow::Error::from(TemplarError::CircularInheritance {
//!     chain: "app → base → app".to_string(),
//! });
//! let ctx = user_friendly_error(error);
//! ctx.display(); // colored error, details and suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for templar operations
///
/// The variants mirror the failure taxonomy of template resolution: a cycle in
/// the inheritance graph, an unusable definition file, a broken contract on the
/// ordered field map, or a collaborator that could not locate a template.
///
/// `KeyNotFound` and `EmptyMapping` indicate a bug in the merge code rather than
/// a user mistake; they are never retried.
#[derive(Error, Debug)]
pub enum TemplarError {
    /// A base template would re-introduce a template that is already registered
    ///
    /// Raised when a declared base resolves to the root template itself or to a
    /// template already present in the resolution order. Fatal for the session and
    /// raised before any prompt or file generation happens.
    ///
    /// # Fields
    /// - `chain`: The inheritance chain that closes the cycle (e.g. `app → base → app`)
    #[error("Circular inheritance detected: {chain}")]
    CircularInheritance {
        /// Inheritance chain leading back to an already registered template
        chain: String,
    },

    /// Template field-definition file missing
    #[error("Template definition file not found: {path}")]
    DefinitionNotFound {
        /// Path where the definition file was expected
        path: String,
    },

    /// Template field-definition file cannot be used
    ///
    /// The file must contain a flat JSON object. Reserved keys must also have the
    /// expected shape (`_bases` is an array of strings, `__prompts__` an object).
    #[error("Invalid template definition in {file}: {reason}")]
    MalformedDefinition {
        /// Path to the offending definition file (or template name)
        file: String,
        /// Reason why the definition was rejected
        reason: String,
    },

    /// Ordered map lookup of a key that is not present
    #[error("Key '{key}' not found in ordered mapping")]
    KeyNotFound {
        /// The missing key
        key: String,
    },

    /// First/last key requested on an empty ordered mapping
    #[error("Ordered mapping is empty")]
    EmptyMapping,

    /// A template locator could not be turned into a local directory
    #[error("Template '{locator}' could not be located: {reason}")]
    TemplateNotFound {
        /// Locator as written in `_bases` or on the command line
        locator: String,
        /// Why the locator could not be resolved
        reason: String,
    },

    /// A generated project carries no stored answers
    #[error("No replay file found in project: {path}")]
    ReplayNotFound {
        /// Project directory that was searched
        path: String,
    },

    /// File system error
    #[error("File system error: {operation}")]
    FileSystemError {
        /// The file system operation that failed
        operation: String,
        /// Path where the file system error occurred
        path: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for TemplarError {
    fn clone(&self) -> Self {
        match self {
            Self::CircularInheritance {
                chain,
            } => Self::CircularInheritance {
                chain: chain.clone(),
            },
            Self::DefinitionNotFound {
                path,
            } => Self::DefinitionNotFound {
                path: path.clone(),
            },
            Self::MalformedDefinition {
                file,
                reason,
            } => Self::MalformedDefinition {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::KeyNotFound {
                key,
            } => Self::KeyNotFound {
                key: key.clone(),
            },
            Self::EmptyMapping => Self::EmptyMapping,
            Self::TemplateNotFound {
                locator,
                reason,
            } => Self::TemplateNotFound {
                locator: locator.clone(),
                reason: reason.clone(),
            },
            Self::ReplayNotFound {
                path,
            } => Self::ReplayNotFound {
                path: path.clone(),
            },
            Self::FileSystemError {
                operation,
                path,
            } => Self::FileSystemError {
                operation: operation.clone(),
                path: path.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            // For errors that don't implement Clone, convert to Other
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::JsonError(e) => Self::Other {
                message: format!("JSON error: {e}"),
            },
            Self::TomlError(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::TomlSerError(e) => Self::Other {
                message: format!("TOML serialization error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// `ErrorContext` wraps a [`TemplarError`] and adds an optional suggestion and
/// details. When displayed, errors show:
/// 1. **Error**: the main error message in red
/// 2. **Details**: additional context in yellow (optional)
/// 3. **Suggestion**: actionable steps in green (optional)
///
/// # Examples
///
/// ```rust,no_run
/// use templar_cli::core::{ErrorContext, TemplarError};
///
/// let context = ErrorContext::new(TemplarError::DefinitionNotFound {
///     path: "./my-template/cookiecutter.json".to_string(),
/// })
/// .with_suggestion("Check the template path")
/// .with_details("Every template needs a cookiecutter.json at its root");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying templar error
    pub error: TemplarError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: TemplarError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`]
///
/// Recognizes [`TemplarError`] anywhere in the error chain (so context added with
/// `anyhow::Context` does not hide it), then [`std::io::Error`], then falls back to
/// the generic message with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(templar_error) = error.chain().find_map(|e| e.downcast_ref::<TemplarError>()) {
        let ctx = create_error_context(templar_error.clone());
        // `downcast_ref` sees through context layers, so look at the outermost link
        if error.chain().next().is_some_and(|outermost| outermost.is::<TemplarError>()) {
            return ctx;
        }
        // Keep the outer context message visible
        let outer = error.to_string();
        return match ctx.details {
            Some(details) => ErrorContext {
                details: Some(format!("{outer}\n{details}")),
                ..ctx
            },
            None => ErrorContext {
                details: Some(outer),
                ..ctx
            },
        };
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(TemplarError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check file ownership and permissions of the template and output directories")
                .with_details(io_error.to_string());
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(TemplarError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct")
                .with_details(io_error.to_string());
            }
            _ => {}
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(TemplarError::Other {
        message,
    })
}

/// Map each [`TemplarError`] variant to its suggestion and details.
fn create_error_context(error: TemplarError) -> ErrorContext {
    match &error {
        TemplarError::CircularInheritance {
            ..
        } => ErrorContext::new(error)
            .with_suggestion(
                "Remove the `_bases` entry that points back to an ancestor, or rename one of two templates sharing a directory name",
            )
            .with_details(
                "Templates are identified by their directory name. A template may not extend itself, an ancestor, or a template already pulled in through another base",
            ),
        TemplarError::DefinitionNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check that the template directory contains a cookiecutter.json file")
            .with_details("Every template, including base templates, needs its own field-definition file"),
        TemplarError::MalformedDefinition {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Fix the JSON syntax of cookiecutter.json")
            .with_details(
                "The definition must be a JSON object; `_bases` and `_copy_without_render` must be arrays of strings and `__prompts__` an object",
            ),
        TemplarError::KeyNotFound {
            ..
        }
        | TemplarError::EmptyMapping => ErrorContext::new(error)
            .with_details("Internal error while ordering template fields")
            .with_suggestion("Please report this issue together with the template definitions involved"),
        TemplarError::TemplateNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion(
                "Use a local path, or clone the repository into the templates directory shown by `templar config show`",
            )
            .with_details("Base templates are looked up as paths, then inside the templates directory"),
        TemplarError::ReplayNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Enable `save_replay` in the templar configuration before generating projects"),
        TemplarError::ConfigError {
            ..
        }
        | TemplarError::TomlError(_)
        | TemplarError::TomlSerError(_) => ErrorContext::new(error)
            .with_suggestion("Check the TOML syntax of the configuration file (`templar config path`)"),
        _ => ErrorContext::new(error),
    }
}
