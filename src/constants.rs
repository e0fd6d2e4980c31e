//! Global constants used throughout the templar codebase.
//!
//! File names, directory names and defaults shared by the resolver, the
//! session and the CLI live here so the magic strings are discoverable.

/// Name of the field-definition file at the root of every template.
pub const DEFINITION_FILE: &str = "cookiecutter.json";

/// Name of the replay file written into a generated project.
pub const REPLAY_FILE: &str = ".templar-replay.json";

/// Sub-directory of a template holding shared include/extend files.
///
/// Added to the templating search path of every template that inherits it.
pub const TEMPLATES_SUBDIR: &str = "templates";

/// Prefix of the temporary directory holding a root template's working copy.
pub const WORKING_COPY_PREFIX: &str = "templar";

/// Glob patterns skipped when copying a template into its working copy.
pub const DEFAULT_WORKING_COPY_IGNORE: &[&str] = &["__pycache__", "*.pyc", "venv", ".venv"];

/// Built-in repository abbreviations; `{0}` is replaced by the rest of the locator.
pub const DEFAULT_ABBREVIATIONS: &[(&str, &str)] = &[
    ("gh", "https://github.com/{0}.git"),
    ("gl", "https://gitlab.com/{0}.git"),
    ("bb", "https://bitbucket.org/{0}"),
];

/// Environment variable overriding the global configuration file location.
pub const CONFIG_ENV_VAR: &str = "TEMPLAR_CONFIG";
