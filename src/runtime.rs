//! Runtime half: resolving, loading and driving embedded script bundles.
//!
//! A [`LoadSite`] is one instance of the `Script` component. It:
//! 1. Is attached to the host renderer (which tells it who encloses it)
//! 2. Accepts its parameters exactly once and resolves the bundle path
//! 3. Lazily imports the module (shared for global bundles) and runs `OnInit`
//! 4. On disposal runs `OnUnload` and releases a non-shared module
//!
//! The host supplies the script engine, the owner lookup and the shared
//! module registry through [`ScriptRuntime`].

pub mod bridge;
pub mod load_site;
pub mod owner;
pub mod params;
pub mod registry;
pub mod resolver;

use std::sync::Arc;

use thiserror::Error;

pub use bridge::{ElementRef, ModuleHandle, ScriptEngine};
pub use load_site::{LoadSite, SiteState};
pub use owner::{CachedOwnerLookup, Origin, OwnerIdentityLookup, OwnerInfo, OwnerTable, RenderHandle};
pub use params::{ParameterView, ScriptParameter, SiteConfig};
pub use registry::ModuleRegistry;

// ---------------------------------------------------------------------------
// RuntimeError
// ---------------------------------------------------------------------------

/// Errors surfaced by load sites.
///
/// `Clone` so a failed lazy load can be handed to every caller awaiting it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("The render handle is already set. Cannot attach a Script more than once.")]
    DoubleAttach,

    #[error("The Script has already been initialized - cannot change parameters after first init.")]
    Reinitialization,

    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    #[error("Invalid value for parameter {name}: expected {expected}")]
    InvalidParameterValue { name: String, expected: &'static str },

    #[error("Failed to load script {path}: {reason}")]
    ModuleLoad { path: String, reason: String },

    #[error("Unable to resolve owner component: {0}")]
    OwnerResolution(String),

    #[error("Invocation of '{identifier}' failed: {reason}")]
    Invocation { identifier: String, reason: String },

    #[error("Failed to dispose script {path}: {reason}")]
    Dispose { path: String, reason: String },

    #[error("The render handle has not been set. Attach the Script before assigning parameters.")]
    NotAttached,

    #[error("The Script has not received its parameters yet.")]
    NotConfigured,

    #[error("The Script has been disposed.")]
    Disposed,
}

// ---------------------------------------------------------------------------
// ScriptRuntime
// ---------------------------------------------------------------------------

/// Application-scoped collaborators shared by every load site.
///
/// Created at application start. Dropping it (after draining the registry,
/// if the host wants to release shared modules) tears the runtime down.
#[derive(Clone)]
pub struct ScriptRuntime {
    engine: Arc<dyn ScriptEngine>,
    registry: Arc<ModuleRegistry>,
    owners: Arc<dyn OwnerIdentityLookup>,
    wrap_in_class: bool,
}

impl ScriptRuntime {
    /// Runtime with a fresh, empty module registry.
    pub fn new(engine: Arc<dyn ScriptEngine>, owners: Arc<dyn OwnerIdentityLookup>) -> Self {
        Self::with_registry(engine, owners, Arc::new(ModuleRegistry::new()))
    }

    pub fn with_registry(
        engine: Arc<dyn ScriptEngine>,
        owners: Arc<dyn OwnerIdentityLookup>,
        registry: Arc<ModuleRegistry>,
    ) -> Self {
        Self {
            engine,
            registry,
            owners,
            wrap_in_class: false,
        }
    }

    /// Match a build that ran with class wrapping: sites with `AsClass` and
    /// no explicit `ClassName` call into their owner's class.
    pub fn with_class_wrapping(mut self, enabled: bool) -> Self {
        self.wrap_in_class = enabled;
        self
    }

    pub fn class_wrapping(&self) -> bool {
        self.wrap_in_class
    }

    pub fn registry(&self) -> Arc<ModuleRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn engine(&self) -> Arc<dyn ScriptEngine> {
        Arc::clone(&self.engine)
    }

    /// Create a new, unattached load site.
    pub fn new_site(&self) -> LoadSite {
        LoadSite::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.registry),
            Arc::clone(&self.owners),
        )
        .with_class_wrapping(self.wrap_in_class)
    }
}
