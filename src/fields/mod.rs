//! Template field definitions
//!
//! A template's `cookiecutter.json` is a flat JSON object whose insertion order
//! matters: it drives prompt order and, through the merge, which template a field
//! came from. [`FieldDefinitions`] wraps the file's entries in an [`OrderedMap`]
//! and gives typed access to the reserved keys:
//!
//! | key | shape | meaning |
//! |-----|-------|---------|
//! | `_bases` | array of strings | locators of the base templates |
//! | `_copy_without_render` | array of strings | globs excluded from substitution |
//! | `__prompts__` | object | key → prompt override |
//! | `_extensions` | array of strings | templating extensions to load |
//!
//! Every key starting with `_` is private to the templating engine. The remaining
//! *public* keys are the user inputs, and the only ones forwarded into base
//! template generations.

pub mod merge;
pub mod ordered_map;

pub use merge::{MergeCursor, MergeReport, merge_base_fields, merge_copy_without_render};
pub use ordered_map::OrderedMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::DEFINITION_FILE;
use crate::core::TemplarError;

/// Key listing the base templates of a template.
pub const BASES_KEY: &str = "_bases";
/// Key listing paths that are copied without substitution.
pub const COPY_WITHOUT_RENDER_KEY: &str = "_copy_without_render";
/// Key holding per-field prompt overrides.
pub const PROMPTS_KEY: &str = "__prompts__";
/// Key listing templating extensions.
pub const EXTENSIONS_KEY: &str = "_extensions";

/// Filled answers for a template: a flat, ordered key → value mapping.
pub type FieldValues = OrderedMap<String, Value>;

/// Whether `key` is reserved for the templating engine.
pub fn is_private_key(key: &str) -> bool {
    key.starts_with('_')
}

/// Copy of `values` without private keys, order preserved.
pub fn public_values(values: &FieldValues) -> FieldValues {
    values
        .iter()
        .filter(|(k, _)| !is_private_key(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Ordered field-definition mapping of one template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldDefinitions {
    entries: OrderedMap<String, Value>,
}

impl FieldDefinitions {
    /// Empty definitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the content of a definition file.
    ///
    /// # Errors
    ///
    /// [`TemplarError::MalformedDefinition`] when `content` is not a JSON object.
    pub fn from_json_str(content: &str, file: &str) -> Result<Self, TemplarError> {
        serde_json::from_str(content).map_err(|e| TemplarError::MalformedDefinition {
            file: file.to_string(),
            reason: e.to_string(),
        })
    }

    /// Serialize as the on-disk format: two-space indented JSON, trailing newline.
    pub fn to_json_string(&self) -> Result<String, TemplarError> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        Ok(content)
    }

    /// All entries, private ones included.
    pub fn entries(&self) -> &OrderedMap<String, Value> {
        &self.entries
    }

    /// Mutable access to all entries.
    pub fn entries_mut(&mut self) -> &mut OrderedMap<String, Value> {
        &mut self.entries
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Public (user input) entries in order.
    pub fn public_entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter().filter(|(k, _)| !is_private_key(k))
    }

    /// Keys of the public entries in order.
    pub fn public_keys(&self) -> Vec<&str> {
        self.public_entries().map(|(k, _)| k.as_str()).collect()
    }

    /// Base template locators, in declaration order. Missing or `null` means none.
    pub fn bases(&self) -> Result<Vec<String>, TemplarError> {
        self.string_list(BASES_KEY)
    }

    /// Paths excluded from substitution.
    pub fn copy_without_render(&self) -> Result<Vec<String>, TemplarError> {
        self.string_list(COPY_WITHOUT_RENDER_KEY)
    }

    /// Templating extensions requested by the template.
    pub fn extensions(&self) -> Result<Vec<String>, TemplarError> {
        self.string_list(EXTENSIONS_KEY)
    }

    /// Replace the `_copy_without_render` list, keeping the key's position.
    pub fn set_copy_without_render(&mut self, paths: Vec<String>) {
        let value = Value::Array(paths.into_iter().map(Value::String).collect());
        self.entries.insert(COPY_WITHOUT_RENDER_KEY.to_string(), value);
    }

    /// Prompt overrides, if the template declares any.
    pub fn prompts(&self) -> Result<Option<&Map<String, Value>>, TemplarError> {
        match self.entries.get(PROMPTS_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(malformed(PROMPTS_KEY, "an object", other)),
        }
    }

    /// Mutable prompt overrides, created empty at the end when missing.
    pub fn prompts_mut(&mut self) -> Result<&mut Map<String, Value>, TemplarError> {
        if matches!(self.entries.get(PROMPTS_KEY), None | Some(Value::Null)) {
            self.entries.insert(PROMPTS_KEY.to_string(), Value::Object(Map::new()));
        }
        match self.entries.get_mut(PROMPTS_KEY) {
            Some(Value::Object(map)) => Ok(map),
            Some(other) => Err(malformed(PROMPTS_KEY, "an object", other)),
            None => Err(TemplarError::KeyNotFound {
                key: PROMPTS_KEY.to_string(),
            }),
        }
    }

    /// Make sure `_copy_without_render` and `__prompts__` exist so a merge can
    /// update them unconditionally. Missing entries are appended in that order.
    pub fn ensure_merge_defaults(&mut self) {
        if !self.entries.contains_key(COPY_WITHOUT_RENDER_KEY) {
            self.entries.insert(COPY_WITHOUT_RENDER_KEY.to_string(), Value::Array(Vec::new()));
        }
        if !self.entries.contains_key(PROMPTS_KEY) {
            self.entries.insert(PROMPTS_KEY.to_string(), Value::Object(Map::new()));
        }
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>, TemplarError> {
        match self.entries.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(malformed(key, "an array of strings", other)),
                })
                .collect(),
            Some(other) => Err(malformed(key, "an array of strings", other)),
        }
    }
}

impl From<OrderedMap<String, Value>> for FieldDefinitions {
    fn from(entries: OrderedMap<String, Value>) -> Self {
        Self {
            entries,
        }
    }
}

fn malformed(key: &str, expected: &str, found: &Value) -> TemplarError {
    TemplarError::MalformedDefinition {
        file: DEFINITION_FILE.to_string(),
        reason: format!("`{key}` must be {expected}, found {found}"),
    }
}
