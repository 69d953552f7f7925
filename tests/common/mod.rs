//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lovejs_bundler::instruction::{Instruction, Value as InstValue};
use lovejs_bundler::runtime::{ModuleHandle, OwnerTable, RenderHandle, ScriptEngine, ScriptRuntime};
use lovejs_bundler::{ComponentDefinition, DEFAULT_SCRIPT_COMPONENT};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Recording script engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub module: ModuleHandle,
    pub identifier: String,
    pub args: Vec<Value>,
}

/// Script engine double: records every call and yields at each suspension
/// point so concurrent callers actually interleave.
#[derive(Default)]
pub struct RecordingEngine {
    next_id: AtomicU64,
    imports: Mutex<Vec<String>>,
    invocations: Mutex<Vec<Invocation>>,
    disposals: Mutex<Vec<ModuleHandle>>,
    missing: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `import(path)` return no handle.
    pub fn mark_missing(&self, path: &str) {
        self.missing.lock().unwrap().insert(path.to_string());
    }

    /// Make `invoke(_, identifier)` fail.
    pub fn mark_failing(&self, identifier: &str) {
        self.failing.lock().unwrap().insert(identifier.to_string());
    }

    pub fn imports(&self) -> Vec<String> {
        self.imports.lock().unwrap().clone()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn invoked(&self, identifier: &str) -> usize {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.identifier == identifier)
            .count()
    }

    pub fn disposals(&self) -> Vec<ModuleHandle> {
        self.disposals.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptEngine for RecordingEngine {
    async fn import(&self, path: &str) -> anyhow::Result<Option<ModuleHandle>> {
        self.imports.lock().unwrap().push(path.to_string());
        tokio::task::yield_now().await;
        if self.missing.lock().unwrap().contains(path) {
            return Ok(None);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(Some(ModuleHandle::new(id, path)))
    }

    async fn invoke(
        &self,
        module: &ModuleHandle,
        identifier: &str,
        args: Vec<Value>,
    ) -> anyhow::Result<Value> {
        tokio::task::yield_now().await;
        self.invocations.lock().unwrap().push(Invocation {
            module: module.clone(),
            identifier: identifier.to_string(),
            args,
        });
        if self.failing.lock().unwrap().contains(identifier) {
            anyhow::bail!("{identifier} threw");
        }
        Ok(Value::String(format!("{identifier}@{}", module.id())))
    }

    async fn dispose(&self, module: &ModuleHandle) -> anyhow::Result<()> {
        tokio::task::yield_now().await;
        self.disposals.lock().unwrap().push(module.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Runtime fixtures
// ---------------------------------------------------------------------------

pub const APP_PACKAGE: &str = "App";

/// Owner table with one app component and one library component.
pub fn owner_table() -> Arc<OwnerTable> {
    let table = OwnerTable::new(APP_PACKAGE);
    table.register("App.Widget", Some("App"), "Widget", APP_PACKAGE);
    table.register("App.Other", Some("App"), "Other", APP_PACKAGE);
    table.register("Lib.Grid", Some("Lib"), "Grid", "Lib");
    Arc::new(table)
}

pub fn runtime(engine: &Arc<RecordingEngine>) -> ScriptRuntime {
    ScriptRuntime::new(engine.clone(), owner_table())
}

pub fn widget_handle() -> RenderHandle {
    RenderHandle::new("App.Widget")
}

// ---------------------------------------------------------------------------
// Build fixtures
// ---------------------------------------------------------------------------

/// A component containing one script declaration.
pub fn component_with_script(
    namespace: &str,
    name: &str,
    params: &[(&str, InstValue)],
    body: &str,
) -> ComponentDefinition {
    let mut instructions = vec![Instruction::OpenComponent {
        sequence: 0,
        component: DEFAULT_SCRIPT_COMPONENT.into(),
    }];
    for (i, (param, value)) in params.iter().enumerate() {
        instructions.push(Instruction::AddComponentParameter {
            sequence: i as u32 + 1,
            name: param.to_string(),
            value: value.clone(),
        });
    }
    instructions.push(Instruction::AddMarkupContent {
        sequence: 100,
        content: InstValue::from(body),
    });
    instructions.push(Instruction::CloseComponent);

    ComponentDefinition {
        namespace: Some(namespace.into()),
        name: name.into(),
        instructions,
    }
}
