//! Script engine bridge.
//!
//! The core never looks inside a module: it imports by path, invokes exports
//! by name and disposes. Every call is a suspension point.

use std::fmt;

use arcstr::ArcStr;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RuntimeError;

/// Opaque reference to a module loaded by the script engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleHandle {
    id: u64,
    path: ArcStr,
}

impl ModuleHandle {
    pub fn new(id: u64, path: impl Into<ArcStr>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }

    /// Engine-assigned identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Path the module was imported from.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}({})", self.id, self.path)
    }
}

/// Reference to a host element, passed to init/unload hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// The host's script engine interop.
#[async_trait]
pub trait ScriptEngine: Send + Sync {
    /// Import the module at `path`. `Ok(None)` means the engine produced no
    /// usable handle.
    async fn import(&self, path: &str) -> anyhow::Result<Option<ModuleHandle>>;

    /// Call the export `identifier` on `module`.
    async fn invoke(
        &self,
        module: &ModuleHandle,
        identifier: &str,
        args: Vec<Value>,
    ) -> anyhow::Result<Value>;

    /// Release `module`.
    async fn dispose(&self, module: &ModuleHandle) -> anyhow::Result<()>;
}

/// Import through the engine, turning failures and a missing handle into
/// [`RuntimeError::ModuleLoad`].
pub(crate) async fn import_module(
    engine: &dyn ScriptEngine,
    path: &str,
) -> Result<ModuleHandle, RuntimeError> {
    match engine.import(path).await {
        Ok(Some(handle)) => Ok(handle),
        Ok(None) => Err(RuntimeError::ModuleLoad {
            path: path.to_string(),
            reason: "import produced no module handle".into(),
        }),
        Err(e) => Err(RuntimeError::ModuleLoad {
            path: path.to_string(),
            reason: format!("{e:#}"),
        }),
    }
}
