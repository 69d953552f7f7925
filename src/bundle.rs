//! Core bundling logic.
//!
//! This module orchestrates the full build pass:
//! 1. Extract script fragments from every component definition
//! 2. Group fragments by bundle key, keeping discovery order per group
//! 3. Render one file per non-empty group (banner + one body per line,
//!    or one class per class name when wrapping)
//! 4. Write `{out_dir}/{key}.g.js`, fully replacing any previous file
//!
//! Groups are recomputed from scratch on every pass, so the output depends
//! only on the fragment set, never on earlier builds.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{debug, info};

use crate::extract;
use crate::naming;
use crate::utils::{self, GlobalRegistration};
use crate::{
    BundleError, BundleOptions, BundlePlan, BundleResult, Diagnostic, DiagnosticLevel,
    EmittedBundle, ScriptFragment,
};

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Fragments sharing one bundle key, in discovery order.
#[derive(Debug, Clone)]
pub struct BundleGroup<'a> {
    pub key: String,
    pub fragments: Vec<&'a ScriptFragment>,
}

/// Group fragments by bundle key. Groups are ordered by key.
pub fn group_fragments(fragments: &[ScriptFragment]) -> Vec<BundleGroup<'_>> {
    let mut groups: BTreeMap<String, Vec<&ScriptFragment>> = BTreeMap::new();
    for fragment in fragments {
        groups.entry(fragment.bundle_key()).or_default().push(fragment);
    }
    groups
        .into_iter()
        .map(|(key, fragments)| BundleGroup { key, fragments })
        .collect()
}

/// One top-level piece of a bundle file.
enum Section<'a> {
    Bare(&'a ScriptFragment),
    /// Every `AsClass` fragment sharing one class name. Sits at the position
    /// of the first such fragment.
    Class {
        name: &'a str,
        members: Vec<&'a ScriptFragment>,
    },
}

fn sections<'a>(group: &BundleGroup<'a>, wrap_in_class: bool) -> Vec<Section<'a>> {
    let mut sections = Vec::new();
    let mut class_slots: HashMap<&str, usize> = HashMap::new();

    for &fragment in &group.fragments {
        if !wrap_in_class || !fragment.as_class {
            sections.push(Section::Bare(fragment));
            continue;
        }
        let name = fragment.class_name.as_str();
        match class_slots.get(name).copied() {
            Some(slot) => {
                if let Section::Class { members, .. } = &mut sections[slot] {
                    members.push(fragment);
                }
            }
            None => {
                class_slots.insert(name, sections.len());
                sections.push(Section::Class {
                    name,
                    members: vec![fragment],
                });
            }
        }
    }
    sections
}

/// Render the file content of a group, or `None` when it has no content.
///
/// With `wrap_in_class`, all `AsClass` fragments of one class name become a
/// single class declaration, so a module never declares the same class twice.
pub fn render_bundle(group: &BundleGroup<'_>, wrap_in_class: bool) -> Option<String> {
    let mut content = String::new();
    for section in sections(group, wrap_in_class) {
        let rendered = match section {
            Section::Bare(fragment) => utils::normalize_newlines(&fragment.body),
            Section::Class { name, members } => {
                let bodies: Vec<&str> = members.iter().map(|f| f.body.as_str()).collect();
                let registration = members
                    .iter()
                    .map(|&f| GlobalRegistration::of(f))
                    .max()
                    .unwrap_or(GlobalRegistration::Unregistered);
                utils::render_class(name, &bodies, registration)
            }
        };
        content.push_str(&rendered);
        content.push('\n');
    }

    if content.trim().is_empty() {
        return None;
    }

    let mut out = utils::bundle_banner(&group.key);
    out.push_str(&content);
    Some(out)
}

/// Group and render all fragments without touching the filesystem.
pub fn build_bundles(fragments: &[ScriptFragment], wrap_in_class: bool) -> Vec<EmittedBundle> {
    group_fragments(fragments)
        .iter()
        .filter_map(|group| {
            let content = render_bundle(group, wrap_in_class)?;
            Some(EmittedBundle {
                key: group.key.clone(),
                file_name: naming::bundle_file_name(&group.key),
                content,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

/// Write one file per non-empty bundle into `out_dir`, creating it if needed.
pub async fn emit(
    fragments: &[ScriptFragment],
    out_dir: &Path,
    wrap_in_class: bool,
) -> Result<Vec<EmittedBundle>, BundleError> {
    let bundles = build_bundles(fragments, wrap_in_class);
    tokio::fs::create_dir_all(out_dir).await?;

    for bundle in &bundles {
        let path = out_dir.join(&bundle.file_name);
        tokio::fs::write(&path, &bundle.content).await?;
        debug!(key = %bundle.key, path = %path.display(), "wrote bundle");
    }

    Ok(bundles)
}

// ---------------------------------------------------------------------------
// Build Pass
// ---------------------------------------------------------------------------

/// Execute one build pass over the plan's components.
pub async fn execute_bundle(
    plan: BundlePlan,
    opts: BundleOptions,
) -> Result<BundleResult, BundleError> {
    validate_plan(&plan, &opts)?;

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    diagnostics.push(Diagnostic {
        level: DiagnosticLevel::Info,
        message: format!("Bundle started for {} components", plan.components.len()),
        context: None,
    });

    let mut fragments: Vec<ScriptFragment> = Vec::new();
    for def in &plan.components {
        let extraction = extract::extract_scripts(def, &opts.script_component);
        fragments.extend(extraction.fragments);
        diagnostics.extend(extraction.diagnostics);
    }

    let bundles = if opts.write_to_disk {
        let out_dir = plan.output_dir();
        let bundles = emit(&fragments, &out_dir, opts.wrap_in_class).await?;
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Info,
            message: format!("Written to {}", out_dir.display()),
            context: None,
        });
        bundles
    } else {
        build_bundles(&fragments, opts.wrap_in_class)
    };

    info!(
        fragments = fragments.len(),
        bundles = bundles.len(),
        "bundle pass complete"
    );
    diagnostics.push(Diagnostic {
        level: DiagnosticLevel::Info,
        message: format!(
            "Bundle complete: {} fragments, {} bundles",
            fragments.len(),
            bundles.len()
        ),
        context: None,
    });

    Ok(BundleResult {
        bundles,
        fragments: fragments.len(),
        diagnostics,
    })
}

fn validate_plan(plan: &BundlePlan, opts: &BundleOptions) -> Result<(), BundleError> {
    if opts.script_component.trim().is_empty() {
        return Err(BundleError::InvalidInput(
            "script component type name must be non-empty".into(),
        ));
    }
    for (index, def) in plan.components.iter().enumerate() {
        if def.name.trim().is_empty() {
            return Err(BundleError::ValidationError(format!(
                "components[{index}].name must be a non-empty string"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
