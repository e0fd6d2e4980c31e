//! Merging base-template fields into a child's definitions.
//!
//! The merge keeps each base's fields contiguous and in the base's own order,
//! places them ahead of the fields the child introduced itself, and never
//! moves or overwrites a field the child already defines.
//!
//! A [`MergeCursor`] marks where the next new field goes. It starts at the front
//! of the target and is carried across all bases of the same target, so bases
//! contribute their fields in declaration order:
//!
//! ```rust
//! use serde_json::json;
//! use templar_cli::fields::{FieldDefinitions, MergeCursor, merge_base_fields};
//!
//! let mut child: FieldDefinitions = serde_json::from_value(json!({"a": 1, "x": 99}))?;
//! let base: FieldDefinitions = serde_json::from_value(json!({"w": 0, "x": 10, "y": 20}))?;
//!
//! let mut cursor = MergeCursor::default();
//! merge_base_fields(&mut child, &base, &mut cursor)?;
//!
//! // `x` keeps the child's value and position, `y` follows it
//! assert_eq!(child.public_keys(), ["w", "a", "x", "y"]);
//! assert_eq!(child.get("x"), Some(&json!(99)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::core::TemplarError;
use crate::fields::FieldDefinitions;

/// Position after which the next merged field is inserted.
///
/// `None` is the front of the target mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeCursor(Option<String>);

impl MergeCursor {
    /// Key the cursor currently follows, if any.
    pub fn anchor(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// What a single base merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Base keys added to the target, in insertion order.
    pub inserted: Vec<String>,
    /// Base keys the target already defined (the target's value was kept).
    pub overridden: Vec<String>,
    /// Prompt overrides copied from the base.
    pub prompts_copied: Vec<String>,
}

/// Merge the public fields of `base` into `target`.
///
/// For each public key of `base`, in order:
/// - already defined by `target`: value and position untouched, the cursor moves
///   to that key;
/// - otherwise: inserted right after the cursor (before the target's first key
///   when the cursor is at the front) and the cursor moves to it. The base's
///   prompt for the key comes along unless `target` already has one.
///
/// Keys the target defines itself never pick up a base prompt.
///
/// # Errors
///
/// [`TemplarError::MalformedDefinition`] if either `__prompts__` is not an object.
pub fn merge_base_fields(
    target: &mut FieldDefinitions,
    base: &FieldDefinitions,
    cursor: &mut MergeCursor,
) -> Result<MergeReport, TemplarError> {
    let mut report = MergeReport::default();
    let base_prompts = base.prompts()?;

    for (key, value) in base.public_entries() {
        if target.contains_key(key) {
            report.overridden.push(key.clone());
        } else {
            let entries = target.entries_mut();
            match cursor.anchor() {
                Some(anchor) => {
                    entries.insert_after(key.clone(), value.clone(), anchor)?;
                }
                None => match entries.first().ok().cloned() {
                    Some(first) => {
                        entries.insert_before(key.clone(), value.clone(), first.as_str())?;
                    }
                    None => {
                        entries.insert(key.clone(), value.clone());
                    }
                },
            }
            report.inserted.push(key.clone());

            if let Some(prompt) = base_prompts.and_then(|prompts| prompts.get(key)) {
                let prompts = target.prompts_mut()?;
                if !prompts.contains_key(key) {
                    prompts.insert(key.clone(), prompt.clone());
                    report.prompts_copied.push(key.clone());
                }
            }
        }
        cursor.0 = Some(key.clone());
    }

    Ok(report)
}

/// Union the base's `_copy_without_render` list into the target's.
///
/// Entries already present are not repeated; new ones are appended in the
/// base's order.
pub fn merge_copy_without_render(
    target: &mut FieldDefinitions,
    base: &FieldDefinitions,
) -> Result<(), TemplarError> {
    let mut paths = target.copy_without_render()?;
    let additions = base.copy_without_render()?;
    if additions.is_empty() && target.contains_key(crate::fields::COPY_WITHOUT_RENDER_KEY) {
        return Ok(());
    }
    for path in additions {
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    target.set_copy_without_render(paths);
    Ok(())
}
