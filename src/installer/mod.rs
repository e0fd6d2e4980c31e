//! Expansion of base templates.
//!
//! Once the user has answered the merged prompts of the root template, every
//! base in the resolution order is generated into the root's output directory
//! before the root's own files are rendered. Files of earlier (more generic)
//! bases are written first and may be overwritten by later bases and finally
//! by the root template itself.
//!
//! # Expansion Process
//!
//! 1. **Guard**: only the first call made while the root template is the
//!    current target proceeds. Generating a base re-enters the host pipeline,
//!    which calls the hooks again; those nested calls are no-ops.
//! 2. **Public values**: private (`_`-prefixed) answers of the root are dropped,
//!    the rest is forwarded to every base as prefilled answers.
//! 3. **Generation**: each base is generated without prompting, over the same
//!    project directory (see [`GenerationOptions::for_base`]).
//! 4. **Environment**: the root's templating environment receives the shared
//!    `templates/` directories and extensions of every base, most derived first.
//!
//! Errors of the host pipeline are returned unchanged. The expansion is not
//! resumed afterwards: the session stays in [`ExpansionStage::Expanding`].

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::fields::{FieldValues, public_values};
use crate::pipeline::{GenerationHooks, GenerationOptions, GenerationPipeline, GenerationRequest};
use crate::template::TemplateId;


/// Where the expansion of a session's bases stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionStage {
    /// Bases not generated yet.
    Pending,
    /// Base generation in progress.
    Expanding,
    /// Every base was generated.
    Installed,
}

/// Per-session bookkeeping of the base expansion.
#[derive(Debug, Clone)]
pub struct ExpansionState {
    stage: ExpansionStage,
    current: TemplateId,
    install_calls: usize,
}

impl ExpansionState {
    /// Fresh state for the session of `root`.
    pub fn new(root: TemplateId) -> Self {
        Self {
            stage: ExpansionStage::Pending,
            current: root,
            install_calls: 0,
        }
    }

    pub fn stage(&self) -> ExpansionStage {
        self.stage
    }

    /// Template whose generation is in progress.
    pub fn current(&self) -> &TemplateId {
        &self.current
    }

    /// Number of times [`install_bases`] was called, no-ops included.
    pub fn install_calls(&self) -> usize {
        self.install_calls
    }
}

/// A base template to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionTarget {
    pub id: TemplateId,
    pub directory: PathBuf,
    /// Extensions the base shares with the root.
    pub extensions: Vec<String>,
}

/// What the orchestrator needs from the session driving it.
///
/// The host is also the [`GenerationHooks`] handed to the pipeline for every
/// base generation, so nested hook calls reach the same state.
pub trait ExpansionHost: GenerationHooks {
    fn root_id(&self) -> &TemplateId;

    fn expansion(&self) -> &ExpansionState;

    fn expansion_mut(&mut self) -> &mut ExpansionState;

    /// Bases in resolution order.
    fn expansion_targets(&self) -> Result<Vec<ExpansionTarget>>;

    /// Called once all bases are generated, most derived base first.
    fn bases_installed(&mut self, targets: &[ExpansionTarget]) -> Result<()>;
}

/// Generate every base of the host's root template under `output_dir`.
///
/// Returns `true` when bases were generated by this call, `false` for a no-op.
pub fn install_bases<H>(
    host: &mut H,
    pipeline: &dyn GenerationPipeline,
    output_dir: &Path,
    values: &FieldValues,
) -> Result<bool>
where
    H: ExpansionHost,
{
    let root = host.root_id().clone();
    let state = host.expansion_mut();
    state.install_calls += 1;

    if state.current != root || state.stage != ExpansionStage::Pending {
        debug!(
            "Skipping base expansion while generating '{}' ({:?}, call {})",
            state.current, state.stage, state.install_calls
        );
        return Ok(false);
    }

    let targets = host.expansion_targets()?;
    if targets.is_empty() {
        return Ok(false);
    }

    info!("Expanding {} base template(s) of '{}'", targets.len(), root);
    host.expansion_mut().stage = ExpansionStage::Expanding;

    let prefilled = public_values(values);
    for target in &targets {
        host.expansion_mut().current = target.id.clone();
        info!("Expanding base template '{}' into {}", target.id, output_dir.display());

        let request = GenerationRequest {
            template_dir: target.directory.clone(),
            prefilled: prefilled.clone(),
            output_dir: output_dir.to_path_buf(),
            options: GenerationOptions::for_base(),
        };
        pipeline.generate(&request, &mut *host)?;
    }

    let state = host.expansion_mut();
    state.stage = ExpansionStage::Installed;
    state.current = root;

    let most_derived_first: Vec<ExpansionTarget> = targets.into_iter().rev().collect();
    host.bases_installed(&most_derived_first)?;
    Ok(true)
}
