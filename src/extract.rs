//! Script extraction from flattened render instructions.
//!
//! A script declaration is an `OpenComponent` of the script component type,
//! followed (not nested) by its parameters and child content, and ended by
//! the next `CloseComponent`. Only literal values can be recovered here;
//! anything computed falls back to its default.
//!
//! Extraction is best effort. A declaration without a closing marker, without
//! literal content, or with a blank body yields no fragment and the build
//! carries on.

use tracing::debug;

use crate::instruction::{Instruction, Value};
use crate::naming::{self, GLOBAL_INDEX};
use crate::{ComponentDefinition, Diagnostic, DiagnosticLevel, ScriptFragment};

// Parameter names understood at build time.
pub const PARAM_GLOBAL_BUNDLE: &str = "GlobalBundle";
pub const PARAM_BUNDLE_NAME: &str = "BundleName";
pub const PARAM_SCRIPT_FILE: &str = "ScriptFile";
pub const PARAM_AS_CLASS: &str = "AsClass";
pub const PARAM_CLASS_NAME: &str = "ClassName";
pub const PARAM_ADD_TO_GLOBAL: &str = "AddToGlobal";
pub const PARAM_ADD_AS_INSTANCE: &str = "AddAsInstance";

/// Fragments found in one component definition, plus the reasons any
/// declaration was skipped.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub fragments: Vec<ScriptFragment>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Whether an `OpenComponent` type names the script component, either
/// directly or as a generic instantiation (`Script<Owner>`).
pub fn is_script_component(component: &str, script_component: &str) -> bool {
    let component = component.trim_start_matches("global::");
    match component.strip_prefix(script_component) {
        Some("") => true,
        Some(rest) => rest.starts_with('<'),
        None => false,
    }
}

/// Extract every script declaration of a component, in instruction order.
pub fn extract_scripts(def: &ComponentDefinition, script_component: &str) -> Extraction {
    let owner = def.identity();
    let instructions = &def.instructions;
    let mut out = Extraction::default();

    for (open, inst) in instructions.iter().enumerate() {
        let Instruction::OpenComponent { component, .. } = inst else {
            continue;
        };
        if !is_script_component(component, script_component) {
            continue;
        }

        let Some(close) = instructions[open..]
            .iter()
            .position(Instruction::is_close_component)
            .map(|offset| open + offset)
        else {
            skip(&mut out, &owner, open, "script declaration has no closing marker");
            continue;
        };

        let span = &instructions[open..close];

        // Last literal content wins.
        let Some(content) = span
            .iter()
            .rev()
            .filter_map(Instruction::content)
            .find_map(Value::literal_text)
        else {
            skip(&mut out, &owner, open, "script declaration has no literal content");
            continue;
        };

        let body = content.trim();
        if body.is_empty() {
            skip(&mut out, &owner, open, "script body is empty");
            continue;
        }

        let params = Parameters { span };
        let class_name = params
            .text(PARAM_CLASS_NAME)
            .unwrap_or_else(|| naming::js_class_name(def.namespace.as_deref(), &def.name));

        out.fragments.push(ScriptFragment {
            owner: owner.clone(),
            body: body.to_string(),
            global_bundle: params.flag(PARAM_GLOBAL_BUNDLE, false),
            bundle_name: Some(
                params
                    .text(PARAM_BUNDLE_NAME)
                    .unwrap_or_else(|| GLOBAL_INDEX.to_string()),
            ),
            script_file: params.text(PARAM_SCRIPT_FILE),
            as_class: params.flag(PARAM_AS_CLASS, true),
            class_name,
            add_to_global: params.flag(PARAM_ADD_TO_GLOBAL, false),
            add_as_instance: params.flag(PARAM_ADD_AS_INSTANCE, false),
        });
    }

    out
}

fn skip(out: &mut Extraction, owner: &str, position: usize, reason: &str) {
    debug!(owner, position, reason, "skipping script declaration");
    out.diagnostics.push(Diagnostic {
        level: DiagnosticLevel::Info,
        message: format!("Skipped script declaration in {owner}: {reason}"),
        context: Some(format!("instruction {position}")),
    });
}

/// Literal parameter lookup inside one declaration span.
/// The first parameter instruction with a matching name is used.
struct Parameters<'a> {
    span: &'a [Instruction],
}

impl Parameters<'_> {
    fn find(&self, name: &str) -> Option<&Value> {
        self.span
            .iter()
            .filter_map(Instruction::parameter)
            .find(|(param, _)| *param == name)
            .map(|(_, value)| value)
    }

    fn flag(&self, name: &str, default: bool) -> bool {
        self.find(name)
            .and_then(Value::literal)
            .and_then(|lit| lit.as_bool())
            .unwrap_or(default)
    }

    fn text(&self, name: &str) -> Option<String> {
        self.find(name)
            .and_then(Value::literal)
            .and_then(|lit| lit.as_text())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
