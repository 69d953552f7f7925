//! Shared module cache for global bundles.
//!
//! One entry per resolved bundle path. The first site to ask for a path
//! performs the import; every later site (including ones that arrive while
//! the import is in flight) gets the same handle. Entries are never evicted
//! by load sites; the host may [`ModuleRegistry::drain`] at shutdown.

use std::sync::Arc;

use arcstr::ArcStr;
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::debug;

use super::bridge::{import_module, ModuleHandle, ScriptEngine};
use super::RuntimeError;

/// Injectable, application-scoped registry of shared module handles.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    entries: DashMap<ArcStr, Arc<OnceCell<ModuleHandle>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared handle for `path`, importing it on first use.
    ///
    /// A failed import leaves the entry empty, so a later site retries.
    pub async fn get_or_import(
        &self,
        engine: &dyn ScriptEngine,
        path: &ArcStr,
    ) -> Result<ModuleHandle, RuntimeError> {
        // Check-and-insert happens under the shard lock, before any await.
        let cell = {
            let entry = self
                .entries
                .entry(path.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()));
            Arc::clone(entry.value())
        };

        if let Some(handle) = cell.get() {
            debug!(%path, "shared module cache hit");
            return Ok(handle.clone());
        }

        cell.get_or_try_init(|| async {
            debug!(%path, "shared module cache miss, importing");
            import_module(engine, path).await
        })
        .await
        .cloned()
    }

    /// Shared handle for `path`, if it has been imported.
    pub fn get(&self, path: &str) -> Option<ModuleHandle> {
        self.entries.get(path).and_then(|e| e.value().get().cloned())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Number of imported shared modules.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry and return the imported handles, ordered by path,
    /// so the host can dispose them when the application shuts down.
    pub fn drain(&self) -> Vec<ModuleHandle> {
        let mut paths: Vec<ArcStr> = self.entries.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
            .into_iter()
            .filter_map(|path| self.entries.remove(&path))
            .filter_map(|(_, cell)| cell.get().cloned())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct CountingEngine {
        imports: AtomicU64,
        fail_first: bool,
    }

    #[async_trait]
    impl ScriptEngine for CountingEngine {
        async fn import(&self, path: &str) -> anyhow::Result<Option<ModuleHandle>> {
            let n = self.imports.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail_first && n == 0 {
                anyhow::bail!("network error");
            }
            Ok(Some(ModuleHandle::new(n, path)))
        }

        async fn invoke(&self, _: &ModuleHandle, _: &str, _: Vec<Value>) -> anyhow::Result<Value> {
            Ok(Value::Null)
        }

        async fn dispose(&self, _: &ModuleHandle) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn concurrent_first_access_imports_once() {
        let registry = ModuleRegistry::new();
        let engine = CountingEngine::default();
        let path = arcstr::literal!("./loveJS/index.g.js");

        let (a, b, c) = tokio::join!(
            registry.get_or_import(&engine, &path),
            registry.get_or_import(&engine, &path),
            registry.get_or_import(&engine, &path),
        );
        let a = a.unwrap();
        assert_eq!(a, b.unwrap());
        assert_eq!(a, c.unwrap());
        assert_eq!(engine.imports.load(Ordering::SeqCst), 1);
        assert!(registry.contains("./loveJS/index.g.js"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn failed_import_is_not_cached() {
        let registry = ModuleRegistry::new();
        let engine = CountingEngine {
            fail_first: true,
            ..Default::default()
        };
        let path = arcstr::literal!("./loveJS/index.g.js");

        let err = registry.get_or_import(&engine, &path).await.unwrap_err();
        assert!(matches!(err, RuntimeError::ModuleLoad { .. }));
        assert!(registry.is_empty());

        assert!(registry.get_or_import(&engine, &path).await.is_ok());
        assert_eq!(engine.imports.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn drain_returns_handles() {
        let registry = ModuleRegistry::new();
        let engine = CountingEngine::default();
        registry
            .get_or_import(&engine, &arcstr::literal!("b.js"))
            .await
            .unwrap();
        registry
            .get_or_import(&engine, &arcstr::literal!("a.js"))
            .await
            .unwrap();

        let drained: Vec<_> = registry.drain().iter().map(|h| h.path().to_string()).collect();
        assert_eq!(drained, vec!["a.js", "b.js"]);
        assert!(registry.is_empty());
    }
}
