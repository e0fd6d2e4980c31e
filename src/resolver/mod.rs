//! Template inheritance resolution.
//!
//! The resolver turns a root template that declares `_bases` into a single,
//! flat set of field definitions and an ordered list of base templates to
//! expand before the root. It runs once per session, before the user is
//! prompted.
//!
//! # Algorithm
//!
//! For every base declared by a template, in declaration order:
//!
//! 1. the locator is resolved and loaded into a [`TemplateRecord`]
//! 2. the record is rejected as circular if it is the root or already registered
//! 3. it is registered in the resolution order
//! 4. its own bases are resolved first, merging them into the base's own fields
//! 5. it is moved to the end of the resolution order
//! 6. its public fields are merged into the inheriting template
//!    ([`merge_base_fields`]) and its `_copy_without_render` list unioned in
//!
//! Because a base is moved to the end only after its own bases were handled,
//! every template in the resolution order comes after all of its bases. For
//! `app → lib → core` the order is `[core, lib]`, and the merged fields of `app`
//! list `core`'s fields, then `lib`'s, then `app`'s own.
//!
//! # Template Resolution Order
//!
//! The resolution order (TRO) is an [`OrderedMap`] keyed by [`TemplateId`]. The
//! registration check is deliberately strict: a template reached twice is
//! rejected even when the second path is not a cycle (a diamond). This keeps
//! every base expanded exactly once and the merge order unambiguous.
//!
//! # States
//!
//! ```text
//! Uninspected ──prepare──> Inspecting ──> Inspected
//!                              │
//!                              └── error: stays Inspecting, later calls fail
//! ```
//!
//! Calling [`InheritanceResolver::prepare`] again once `Inspected` does nothing.

pub mod inheritance_graph;

pub use inheritance_graph::InheritanceGraph;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::TemplarError;
use crate::fields::{FieldDefinitions, MergeCursor, OrderedMap, merge_base_fields, merge_copy_without_render};
use crate::source::RepositoryResolver;
use crate::template::{TemplateId, TemplateRecord};

/// Progress of the resolution of one session's root template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectionState {
    Uninspected,
    Inspecting,
    Inspected,
}

/// Where base locators are materialized.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub repositories: &'a dyn RepositoryResolver,
    pub clone_to_dir: &'a Path,
}

/// Builds the resolution order and merges base fields into the root.
#[derive(Debug, Clone)]
pub struct InheritanceResolver {
    state: InspectionState,
    order: OrderedMap<TemplateId, TemplateRecord>,
    graph: InheritanceGraph,
    /// Templates currently being inspected, root first.
    stack: Vec<TemplateId>,
}

impl InheritanceResolver {
    pub fn new() -> Self {
        Self {
            state: InspectionState::Uninspected,
            order: OrderedMap::new(),
            graph: InheritanceGraph::new(),
            stack: Vec::new(),
        }
    }

    pub fn state(&self) -> InspectionState {
        self.state
    }

    pub fn is_inspected(&self) -> bool {
        self.state == InspectionState::Inspected
    }

    /// Bases in expansion order.
    pub fn resolution_order(&self) -> &OrderedMap<TemplateId, TemplateRecord> {
        &self.order
    }

    /// Base records in expansion order.
    pub fn bases(&self) -> impl Iterator<Item = &TemplateRecord> {
        self.order.values()
    }

    /// Edges followed during resolution.
    pub fn graph(&self) -> &InheritanceGraph {
        &self.graph
    }

    /// Resolve the bases of `root` and merge them into its definitions.
    ///
    /// `materialize` is called on the first inspection of a root that declares
    /// bases; it returns the directory of a private copy of the root template,
    /// which the root record is moved to. The merged definitions are written
    /// there, never to the original template.
    ///
    /// Returns `true` when the root declares bases.
    ///
    /// # Errors
    ///
    /// - [`TemplarError::CircularInheritance`] if a base is reached twice or is the root
    /// - [`TemplarError::DefinitionNotFound`] / [`TemplarError::MalformedDefinition`]
    ///   for unusable definition files
    /// - any error of the repository resolver, unchanged
    pub fn prepare<F>(
        &mut self,
        root: &mut TemplateRecord,
        ctx: ResolveContext<'_>,
        materialize: F,
    ) -> Result<bool>
    where
        F: FnOnce(&Path) -> Result<PathBuf>,
    {
        match self.state {
            InspectionState::Inspected => return Ok(!self.order.is_empty()),
            InspectionState::Inspecting => {
                return Err(TemplarError::Other {
                    message: format!("Resolution of template '{}' did not complete", root.id()),
                }
                .into());
            }
            InspectionState::Uninspected => {}
        }

        root.reload()?;
        if root.fields().bases()?.is_empty() {
            debug!("Template '{}' declares no bases", root.id());
            self.state = InspectionState::Inspected;
            return Ok(false);
        }

        let private_dir = materialize(root.directory())?;
        root.relocate(&private_dir)?;

        self.state = InspectionState::Inspecting;
        self.graph.add_template(root.id().clone());
        root.fields_mut().ensure_merge_defaults();

        let root_id = root.id().clone();
        self.stack = vec![root_id.clone()];
        self.inspect(&root_id, root.fields_mut(), ctx)?;
        self.stack.clear();

        root.save()?;
        debug!(
            "Merged definitions of '{}':\n{}",
            root.id(),
            root.fields().to_json_string()?.trim_end()
        );
        info!(
            "Resolved {} base template(s) for '{}': {}",
            self.order.len(),
            root.id(),
            self.order.keys().map(TemplateId::as_str).collect::<Vec<_>>().join(", ")
        );

        self.state = InspectionState::Inspected;
        Ok(true)
    }

    /// Resolve and merge the bases declared by `target`, the template on top of
    /// the inspection stack.
    fn inspect(
        &mut self,
        root_id: &TemplateId,
        target: &mut FieldDefinitions,
        ctx: ResolveContext<'_>,
    ) -> Result<()> {
        let locators = target.bases()?;
        let Some(owner) = self.stack.last().cloned() else {
            return Ok(());
        };

        let mut cursor = MergeCursor::default();
        for locator in locators {
            let base = TemplateRecord::from_locator(&locator, ctx.repositories, ctx.clone_to_dir)?;
            let id = base.id().clone();
            self.graph.add_base(owner.clone(), id.clone());
            self.register(root_id, base)?;

            // The base's own bases merge into the base, not into `target`
            self.stack.push(id.clone());
            let mut base_fields = std::mem::take(self.record_mut(&id)?.fields_mut());
            let inspected = self.inspect(root_id, &mut base_fields, ctx);
            *self.record_mut(&id)?.fields_mut() = base_fields;
            inspected?;
            self.stack.pop();

            self.order.move_to_end(&id)?;

            let base_fields = self.record(&id)?.fields();
            let report = merge_base_fields(target, base_fields, &mut cursor)?;
            merge_copy_without_render(target, base_fields)?;
            debug!(
                "Merged '{}' into '{}': {} inserted, {} kept",
                id,
                owner,
                report.inserted.len(),
                report.overridden.len()
            );
        }

        Ok(())
    }

    fn register(&mut self, root_id: &TemplateId, base: TemplateRecord) -> Result<()> {
        let id = base.id();
        if id == root_id || self.order.contains_key(id) {
            let mut chain: Vec<&str> = self.stack.iter().map(TemplateId::as_str).collect();
            chain.push(id.as_str());
            return Err(TemplarError::CircularInheritance {
                chain: chain.join(" → "),
            }
            .into());
        }
        debug!("Registering base template '{}' from {}", id, base.locator());
        self.order.insert(id.clone(), base);
        Ok(())
    }

    fn record(&self, id: &TemplateId) -> Result<&TemplateRecord> {
        self.order.get(id).ok_or_else(|| {
            TemplarError::KeyNotFound {
                key: id.to_string(),
            }
            .into()
        })
    }

    fn record_mut(&mut self, id: &TemplateId) -> Result<&mut TemplateRecord> {
        self.order.get_mut(id).ok_or_else(|| {
            TemplarError::KeyNotFound {
                key: id.to_string(),
            }
            .into()
        })
    }
}

impl Default for InheritanceResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFINITION_FILE;
    use crate::source::LocalRepositoryResolver;
    use serde_json::{Value, json};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        repositories: LocalRepositoryResolver,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                temp: TempDir::new().unwrap(),
                repositories: LocalRepositoryResolver::new(),
            }
        }

        fn template(&self, name: &str, definitions: Value) -> PathBuf {
            let dir = self.temp.path().join("templates").join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(DEFINITION_FILE), serde_json::to_string_pretty(&definitions).unwrap())
                .unwrap();
            dir
        }

        fn ctx(&self) -> ResolveContext<'_> {
            ResolveContext {
                repositories: &self.repositories,
                clone_to_dir: self.temp.path(),
            }
        }

        /// Copies the root next to the original, under `copies/`.
        fn resolve(&self, root_dir: &Path) -> (InheritanceResolver, TemplateRecord, Result<bool>) {
            let mut resolver = InheritanceResolver::new();
            let mut root = TemplateRecord::load(root_dir).unwrap();
            let copies = self.temp.path().join("copies");
            let result = resolver.prepare(&mut root, self.ctx(), |dir| {
                let target = copies.join(dir.file_name().unwrap());
                fs::create_dir_all(&target)?;
                fs::copy(dir.join(DEFINITION_FILE), target.join(DEFINITION_FILE))?;
                Ok(target)
            });
            (resolver, root, result)
        }
    }

    fn order_names(resolver: &InheritanceResolver) -> Vec<&str> {
        resolver.resolution_order().keys().map(TemplateId::as_str).collect()
    }

    fn loc(path: &Path) -> String {
        path.display().to_string()
    }

    #[test]
    fn test_template_without_bases_is_left_alone() {
        let fx = Fixture::new();
        let root_dir = fx.template("plain", json!({"a": 1}));

        let (resolver, root, result) = fx.resolve(&root_dir);
        assert!(!result.unwrap());
        assert!(resolver.is_inspected());
        assert!(resolver.resolution_order().is_empty());
        assert_eq!(root.directory(), root_dir);
    }

    #[test]
    fn test_single_base_literal_example() {
        let fx = Fixture::new();
        let base = fx.template("B", json!({"x": 10, "y": 20}));
        let root_dir = fx.template("A", json!({"a": 1, "_bases": [loc(&base)]}));

        let (resolver, root, result) = fx.resolve(&root_dir);
        assert!(result.unwrap());
        assert_eq!(order_names(&resolver), ["B"]);

        let keys: Vec<&str> = root.fields().entries().keys().map(String::as_str).collect();
        assert_eq!(keys, ["x", "y", "a", "_bases", "_copy_without_render", "__prompts__"]);
        assert_eq!(root.fields().get("x"), Some(&json!(10)));

        // Written to the private copy, original untouched
        assert_ne!(root.directory(), root_dir);
        let saved = TemplateRecord::load(root.directory()).unwrap();
        assert_eq!(saved.fields(), root.fields());
        let original = TemplateRecord::load(&root_dir).unwrap();
        assert_eq!(original.fields().public_keys(), ["a"]);
    }

    #[test]
    fn test_transitive_chain() {
        let fx = Fixture::new();
        let c = fx.template("C", json!({"c1": 1, "c2": 2}));
        let b = fx.template("B", json!({"b1": 1, "_bases": [loc(&c)]}));
        let a = fx.template("A", json!({"a1": 1, "_bases": [loc(&b)]}));

        let (resolver, root, result) = fx.resolve(&a);
        result.unwrap();

        assert_eq!(order_names(&resolver), ["C", "B"]);
        assert_eq!(root.fields().public_keys(), ["c1", "c2", "b1", "a1"]);

        // C merged into B's own mapping as well
        let b_record = resolver.resolution_order().get(&TemplateId::from("B")).unwrap();
        assert_eq!(b_record.fields().public_keys(), ["c1", "c2", "b1"]);
        assert_eq!(resolver.graph().topological_order().unwrap().len(), 3);
    }

    #[test]
    fn test_multiple_bases_in_declaration_order() {
        let fx = Fixture::new();
        let first = fx.template("first", json!({"f": 1, "shared": "first"}));
        let second = fx.template("second", json!({"s": 1, "shared": "second"}));
        let root_dir =
            fx.template("root", json!({"r": 1, "_bases": [loc(&first), loc(&second)]}));

        let (resolver, root, result) = fx.resolve(&root_dir);
        result.unwrap();

        assert_eq!(order_names(&resolver), ["first", "second"]);
        assert_eq!(root.fields().public_keys(), ["f", "shared", "s", "r"]);
        assert_eq!(root.fields().get("shared"), Some(&json!("first")));
    }

    #[test]
    fn test_child_values_win() {
        let fx = Fixture::new();
        let base = fx.template("base", json!({"license": "GPL", "author": "base"}));
        let root_dir =
            fx.template("app", json!({"name": "app", "license": "MIT", "_bases": [loc(&base)]}));

        let (_, root, result) = fx.resolve(&root_dir);
        result.unwrap();
        assert_eq!(root.fields().get("license"), Some(&json!("MIT")));
        assert_eq!(root.fields().public_keys(), ["name", "license", "author"]);
    }

    #[test]
    fn test_direct_cycle_is_rejected_and_original_untouched() {
        let fx = Fixture::new();
        let a_dir = fx.temp.path().join("templates").join("A");
        let b = fx.template("B", json!({"b": 1, "_bases": [loc(&a_dir)]}));
        let a = fx.template("A", json!({"a": 1, "_bases": [loc(&b)]}));
        let before = fs::read_to_string(a.join(DEFINITION_FILE)).unwrap();

        let (resolver, _, result) = fx.resolve(&a);
        let err = result.unwrap_err();
        match err.downcast_ref::<TemplarError>() {
            Some(TemplarError::CircularInheritance {
                chain,
            }) => assert_eq!(chain, "A → B → A"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(resolver.state(), InspectionState::Inspecting);
        assert_eq!(fs::read_to_string(a.join(DEFINITION_FILE)).unwrap(), before);
    }

    #[test]
    fn test_self_inheritance_is_rejected() {
        let fx = Fixture::new();
        let a_dir = fx.temp.path().join("templates").join("self");
        fx.template("self", json!({"_bases": [loc(&a_dir)]}));

        let (_, _, result) = fx.resolve(&a_dir);
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TemplarError>(),
            Some(TemplarError::CircularInheritance { .. })
        ));
    }

    #[test]
    fn test_shared_ancestor_is_rejected() {
        let fx = Fixture::new();
        let core = fx.template("core", json!({"c": 1}));
        let left = fx.template("left", json!({"l": 1, "_bases": [loc(&core)]}));
        let right = fx.template("right", json!({"r": 1, "_bases": [loc(&core)]}));
        let app = fx.template("app", json!({"_bases": [loc(&left), loc(&right)]}));

        let (_, _, result) = fx.resolve(&app);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("app → right → core"));
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let fx = Fixture::new();
        let base = fx.template("base", json!({"x": 1}));
        let root_dir = fx.template("root", json!({"a": 1, "_bases": [loc(&base)]}));

        let (mut resolver, mut root, result) = fx.resolve(&root_dir);
        result.unwrap();
        let merged = root.fields().clone();

        let again = resolver
            .prepare(&mut root, fx.ctx(), |_| panic!("working copy created twice"))
            .unwrap();
        assert!(again);
        assert_eq!(root.fields(), &merged);
        assert_eq!(resolver.resolution_order().len(), 1);
    }

    #[test]
    fn test_missing_base_propagates() {
        let fx = Fixture::new();
        let root_dir = fx.template("root", json!({"_bases": ["does-not-exist"]}));
        let (_, _, result) = fx.resolve(&root_dir);
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TemplarError>(),
            Some(TemplarError::TemplateNotFound { .. })
        ));
    }
}
