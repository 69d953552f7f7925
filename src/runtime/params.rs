//! Strict parameter binding for load sites.
//!
//! The host hands over `(name, value)` pairs. Each pair is validated against
//! a fixed allow-list and turned into a [`ScriptParameter`]; unknown names
//! and ill-typed values are errors, unlike build-time extraction which just
//! ignores them.

use std::borrow::Cow;

use serde_json::Value;

use super::bridge::ElementRef;
use super::RuntimeError;
use crate::naming::GLOBAL_INDEX;

/// One recognized load-site parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptParameter {
    ChildContent(Option<String>),
    GlobalBundle(bool),
    BundleName(Option<String>),
    OnInit(Option<String>),
    OnUnload(Option<String>),
    ScriptFile(Option<String>),
    AsClass(bool),
    ClassName(Option<String>),
    AddToGlobal(bool),
    AddAsInstance(bool),
    HostRef(Option<ElementRef>),
}

impl ScriptParameter {
    /// Parse a named host value.
    pub fn from_named(name: &str, value: Value) -> Result<Self, RuntimeError> {
        let param = match name {
            "ChildContent" => Self::ChildContent(text(name, value)?),
            "GlobalBundle" => Self::GlobalBundle(flag(name, value)?),
            "BundleName" => Self::BundleName(text(name, value)?),
            "OnInit" => Self::OnInit(text(name, value)?),
            "OnUnload" => Self::OnUnload(text(name, value)?),
            "ScriptFile" => Self::ScriptFile(text(name, value)?),
            "AsClass" => Self::AsClass(flag(name, value)?),
            "ClassName" => Self::ClassName(text(name, value)?),
            "AddToGlobal" => Self::AddToGlobal(flag(name, value)?),
            "AddAsInstance" => Self::AddAsInstance(flag(name, value)?),
            "HostRef" => Self::HostRef(text(name, value)?.map(ElementRef)),
            _ => {
                return Err(RuntimeError::UnknownParameter {
                    name: name.to_string(),
                })
            }
        };
        Ok(param)
    }
}

fn flag(name: &str, value: Value) -> Result<bool, RuntimeError> {
    value.as_bool().ok_or_else(|| RuntimeError::InvalidParameterValue {
        name: name.to_string(),
        expected: "a boolean",
    })
}

fn text(name: &str, value: Value) -> Result<Option<String>, RuntimeError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        _ => Err(RuntimeError::InvalidParameterValue {
            name: name.to_string(),
            expected: "a string or null",
        }),
    }
}

// ---------------------------------------------------------------------------
// ParameterView
// ---------------------------------------------------------------------------

/// Ordered `(name, value)` pairs supplied by the host in one assignment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterView {
    entries: Vec<(String, Value)>,
}

impl ParameterView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style push.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate every entry, failing on the first unknown or ill-typed one.
    pub fn parse(self) -> Result<Vec<ScriptParameter>, RuntimeError> {
        self.entries
            .into_iter()
            .map(|(name, value)| ScriptParameter::from_named(&name, value))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// SiteConfig
// ---------------------------------------------------------------------------

/// Frozen configuration of a load site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub child_content: Option<String>,
    pub global_bundle: bool,
    pub bundle_name: Option<String>,
    pub on_init: Option<String>,
    pub on_unload: Option<String>,
    pub script_file: Option<String>,
    pub as_class: bool,
    pub class_name: Option<String>,
    pub add_to_global: bool,
    pub add_as_instance: bool,
    pub host_ref: Option<ElementRef>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            child_content: None,
            global_bundle: false,
            bundle_name: Some(GLOBAL_INDEX.to_string()),
            on_init: None,
            on_unload: None,
            script_file: None,
            as_class: true,
            class_name: None,
            add_to_global: false,
            add_as_instance: false,
            host_ref: None,
        }
    }
}

impl SiteConfig {
    /// Build a configuration from one host assignment.
    pub fn from_parameters(view: ParameterView) -> Result<Self, RuntimeError> {
        let mut config = Self::default();
        for param in view.parse()? {
            config.apply(param);
        }
        Ok(config)
    }

    pub fn apply(&mut self, param: ScriptParameter) {
        match param {
            ScriptParameter::ChildContent(v) => self.child_content = v,
            ScriptParameter::GlobalBundle(v) => self.global_bundle = v,
            ScriptParameter::BundleName(v) => self.bundle_name = v,
            ScriptParameter::OnInit(v) => self.on_init = v,
            ScriptParameter::OnUnload(v) => self.on_unload = v,
            ScriptParameter::ScriptFile(v) => self.script_file = v,
            ScriptParameter::AsClass(v) => self.as_class = v,
            ScriptParameter::ClassName(v) => self.class_name = v,
            ScriptParameter::AddToGlobal(v) => self.add_to_global = v,
            ScriptParameter::AddAsInstance(v) => self.add_as_instance = v,
            ScriptParameter::HostRef(v) => self.host_ref = v,
        }
    }

    /// Qualify an export name with the class prefix when the bundle is
    /// organized as a class (`AsClass` with an explicit `ClassName`).
    pub fn qualify<'a>(&self, identifier: &'a str) -> Cow<'a, str> {
        match (&self.class_name, self.as_class) {
            (Some(class), true) => Cow::Owned(format!("{class}.{identifier}")),
            _ => Cow::Borrowed(identifier),
        }
    }

    /// Host element argument passed to init/unload hooks.
    pub fn host_ref_arg(&self) -> Value {
        match &self.host_ref {
            Some(ElementRef(id)) => Value::String(id.clone()),
            None => Value::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
