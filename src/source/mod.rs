//! Locating template repositories.
//!
//! Templates are referenced by *locators*: a local path, a repository URL, or
//! an abbreviation such as `gh:org/repo`. A [`RepositoryResolver`] turns a
//! locator into a local directory holding the template.
//!
//! # Components
//!
//! - [`RepositoryResolver`] - the seam used by the resolver and the CLI
//! - [`LocalRepositoryResolver`] - resolves paths and already-materialized repositories
//! - [`expand_abbreviations`] / [`is_repo_url`] - locator helpers
//!
//! Fetching repositories over the network is left to other resolvers. The local
//! resolver only reuses a repository that is already present in the clone
//! directory, under the repository's name.

use anyhow::Result;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

use crate::constants::{DEFAULT_ABBREVIATIONS, DEFINITION_FILE};
use crate::core::TemplarError;

/// A locator materialized on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRepository {
    /// Directory containing the template's `cookiecutter.json`.
    pub directory: PathBuf,
    /// Whether the directory was created for this resolution and may be deleted afterwards.
    pub is_temporary: bool,
}

/// Turns template locators into local directories.
///
/// Implementations must be idempotent: resolving the same locator into the
/// same `clone_to_dir` twice yields the same directory.
pub trait RepositoryResolver {
    fn resolve(&self, locator: &str, clone_to_dir: &Path) -> Result<ResolvedRepository>;
}

/// Expand a locator abbreviation.
///
/// An exact match replaces the whole locator. Otherwise `prefix:rest` is looked
/// up by `prefix` and `{0}` in the expansion is replaced by `rest`.
///
/// ```rust
/// use std::collections::BTreeMap;
/// use templar_cli::source::expand_abbreviations;
///
/// let mut abbreviations = BTreeMap::new();
/// abbreviations.insert("gh".to_string(), "https://github.com/{0}.git".to_string());
///
/// assert_eq!(
///     expand_abbreviations("gh:acme/python-lib", &abbreviations),
///     "https://github.com/acme/python-lib.git"
/// );
/// assert_eq!(expand_abbreviations("../local", &abbreviations), "../local");
/// ```
pub fn expand_abbreviations(locator: &str, abbreviations: &BTreeMap<String, String>) -> String {
    if let Some(expansion) = abbreviations.get(locator) {
        return expansion.clone();
    }
    if let Some((prefix, rest)) = locator.split_once(':') {
        if let Some(expansion) = abbreviations.get(prefix) {
            return expansion.replace("{0}", rest);
        }
    }
    locator.to_string()
}

/// Built-in abbreviations (`gh`, `gl`, `bb`).
pub fn default_abbreviations() -> BTreeMap<String, String> {
    DEFAULT_ABBREVIATIONS.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}

fn repo_url_regex() -> Option<&'static Regex> {
    static REPO_URL: OnceLock<Option<Regex>> = OnceLock::new();
    REPO_URL
        .get_or_init(|| Regex::new(r"^((((git|hg)\+)?(git|ssh|file|https?):(//)?)|(\w+@[\w.]+))").ok())
        .as_ref()
}

/// Whether `locator` designates a remote repository rather than a path.
pub fn is_repo_url(locator: &str) -> bool {
    repo_url_regex().is_some_and(|re| re.is_match(locator))
}

/// Name of the directory a repository URL is cloned into.
///
/// The last path segment with any `.git` suffix removed.
pub fn repository_name(url: &str) -> Option<&str> {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Resolver for templates already present on disk.
#[derive(Debug, Clone)]
pub struct LocalRepositoryResolver {
    abbreviations: BTreeMap<String, String>,
}

impl LocalRepositoryResolver {
    /// Resolver using the built-in abbreviations.
    pub fn new() -> Self {
        Self {
            abbreviations: default_abbreviations(),
        }
    }

    /// Resolver using `abbreviations` on top of the built-in ones.
    pub fn with_abbreviations(abbreviations: BTreeMap<String, String>) -> Self {
        let mut merged = default_abbreviations();
        merged.extend(abbreviations);
        Self {
            abbreviations: merged,
        }
    }

    pub fn abbreviations(&self) -> &BTreeMap<String, String> {
        &self.abbreviations
    }

    fn resolve_url(&self, locator: &str, url: &str, clone_to_dir: &Path) -> Result<ResolvedRepository> {
        let name = repository_name(url).ok_or_else(|| TemplarError::TemplateNotFound {
            locator: locator.to_string(),
            reason: format!("cannot derive a repository name from '{url}'"),
        })?;
        let directory = clone_to_dir.join(name);
        if is_template_dir(&directory) {
            debug!("Reusing repository '{}' from {}", url, directory.display());
            return Ok(ResolvedRepository {
                directory,
                is_temporary: false,
            });
        }
        Err(TemplarError::TemplateNotFound {
            locator: locator.to_string(),
            reason: format!(
                "repository is not available locally (expected a template in {})",
                directory.display()
            ),
        }
        .into())
    }

    fn resolve_path(&self, locator: &str, clone_to_dir: &Path) -> Result<ResolvedRepository> {
        let expanded = shellexpand::tilde(locator);
        let given = PathBuf::from(expanded.as_ref());
        let candidates = if given.is_absolute() {
            vec![given]
        } else {
            vec![given.clone(), clone_to_dir.join(&given)]
        };

        for candidate in &candidates {
            if is_template_dir(candidate) {
                return Ok(ResolvedRepository {
                    directory: candidate.clone(),
                    is_temporary: false,
                });
            }
        }

        let tried =
            candidates.iter().map(|c| c.display().to_string()).collect::<Vec<_>>().join(", ");
        Err(TemplarError::TemplateNotFound {
            locator: locator.to_string(),
            reason: format!("no directory containing {DEFINITION_FILE} (tried {tried})"),
        }
        .into())
    }
}

impl Default for LocalRepositoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryResolver for LocalRepositoryResolver {
    fn resolve(&self, locator: &str, clone_to_dir: &Path) -> Result<ResolvedRepository> {
        let expanded = expand_abbreviations(locator, &self.abbreviations);
        if is_repo_url(&expanded) {
            self.resolve_url(locator, &expanded, clone_to_dir)
        } else {
            self.resolve_path(&expanded, clone_to_dir)
        }
    }
}

fn is_template_dir(path: &Path) -> bool {
    path.join(DEFINITION_FILE).is_file()
}
