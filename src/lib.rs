//! # LoveJS Bundler
//!
//! Lets a component author embed script source inside a component
//! definition. At build time the embedded scripts are extracted from the
//! flattened render instructions, grouped into named bundles and written out
//! as `{key}.g.js` files. At run time each `Script` load site resolves the
//! same bundle key, imports the file once, and drives its init/unload hooks.
//!
//! The two halves never communicate directly; they agree through the shared
//! naming rules in [`naming`].

pub mod bundle;
pub mod extract;
pub mod instruction;
pub mod naming;
pub mod runtime;
pub mod utils;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instruction::Instruction;

// ---------------------------------------------------------------------------
// Component Definition (input)
// ---------------------------------------------------------------------------

/// One compiled component: its identity plus the flattened render
/// instructions the host compiler produced for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentDefinition {
    #[serde(default)]
    pub namespace: Option<String>,
    pub name: String,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

impl ComponentDefinition {
    /// Qualified owner identity (`{namespace}.{name}`).
    pub fn identity(&self) -> String {
        naming::owner_identity(self.namespace.as_deref(), &self.name)
    }
}

// ---------------------------------------------------------------------------
// Script Fragment
// ---------------------------------------------------------------------------

/// One discovered script embedding. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFragment {
    /// Qualified identity of the declaring component.
    pub owner: String,
    /// Trimmed script body. Never empty.
    pub body: String,
    pub global_bundle: bool,
    pub bundle_name: Option<String>,
    /// Runtime-only override of the script path. Does not affect emission.
    pub script_file: Option<String>,
    pub as_class: bool,
    pub class_name: String,
    pub add_to_global: bool,
    pub add_as_instance: bool,
}

impl ScriptFragment {
    /// Bundle key this fragment is emitted into.
    pub fn bundle_key(&self) -> String {
        naming::bundle_key(self.global_bundle, self.bundle_name.as_deref(), &self.owner)
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A structured diagnostic emitted during bundling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

// ---------------------------------------------------------------------------
// BundlePlan
// ---------------------------------------------------------------------------

/// Describes WHAT to bundle.
#[derive(Debug, Clone)]
pub struct BundlePlan {
    /// Every component definition of the build pass.
    pub components: Vec<ComponentDefinition>,
    /// Project directory. Bundles go to `{project_root}/wwwroot/loveJS`.
    pub project_root: PathBuf,
    /// Explicit output directory, overriding the project convention.
    pub out_dir: Option<PathBuf>,
}

impl BundlePlan {
    pub fn new(project_root: impl Into<PathBuf>, components: Vec<ComponentDefinition>) -> Self {
        Self {
            components,
            project_root: project_root.into(),
            out_dir: None,
        }
    }

    /// Directory the bundle files are written to.
    pub fn output_dir(&self) -> PathBuf {
        self.out_dir.clone().unwrap_or_else(|| {
            self.project_root
                .join(naming::STATIC_ROOT)
                .join(naming::JS_OUTPUT_DIR)
        })
    }
}

// ---------------------------------------------------------------------------
// BundleOptions
// ---------------------------------------------------------------------------

/// Type name of the script-loading component.
pub const DEFAULT_SCRIPT_COMPONENT: &str = "LoveJS.Script";

/// Describes HOW to bundle.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Component type whose open marker starts a script declaration.
    /// Generic instantiations (`LoveJS.Script<T>`) match as well.
    pub script_component: String,
    /// Emit `AsClass` fragments as members of a synthetic class.
    pub wrap_in_class: bool,
    /// Whether to write output files to disk.
    pub write_to_disk: bool,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            script_component: DEFAULT_SCRIPT_COMPONENT.to_string(),
            wrap_in_class: false,
            write_to_disk: true,
        }
    }
}

// ---------------------------------------------------------------------------
// BundleResult
// ---------------------------------------------------------------------------

/// One emitted bundle file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedBundle {
    pub key: String,
    pub file_name: String,
    pub content: String,
}

/// The sealed output of a build pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleResult {
    /// Emitted bundles, ordered by key.
    pub bundles: Vec<EmittedBundle>,
    /// Number of fragments extracted across all components.
    pub fragments: usize,
    pub diagnostics: Vec<Diagnostic>,
}

// ---------------------------------------------------------------------------
// BundleError
// ---------------------------------------------------------------------------

/// Errors that abort a build pass.
///
/// Malformed script declarations never end up here; they are skipped and
/// reported as diagnostics.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run one build pass: extract every script declaration from the plan's
/// components, group them into bundles and (optionally) write the files.
pub async fn bundle_components(
    plan: BundlePlan,
    opts: BundleOptions,
) -> Result<BundleResult, BundleError> {
    bundle::execute_bundle(plan, opts).await
}
