//! Bundle naming shared by the build-time emitter and the runtime resolver.
//!
//! Both halves of the system compute the bundle key with [`bundle_key`] and
//! never talk to each other directly. Changing anything here changes every
//! emitted file name and every path a `LoadSite` imports, so the functions
//! must stay pure and deterministic.

use once_cell::sync::Lazy;
use regex::Regex;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Bundle name used when none is supplied.
pub const GLOBAL_INDEX: &str = "index";

/// Directory (under the static assets root) that holds generated bundles.
pub const JS_OUTPUT_DIR: &str = "loveJS";

/// Extension of emitted script files.
pub const SCRIPT_EXT: &str = "js";

/// Static assets root relative to the project directory.
pub const STATIC_ROOT: &str = "wwwroot";

/// URL prefix under which library packages expose their static assets.
pub const LIBRARY_CONTENT_ROOT: &str = "_content";

/// Separator between the owner identity and the bundle name.
///
/// Owner identities are namespace-qualified and already contain `.`; two
/// distinct owners producing the same key is a known, accepted limitation.
pub const KEY_SEPARATOR: char = '.';

// ---------------------------------------------------------------------------
// Bundle Keys
// ---------------------------------------------------------------------------

/// Compute the bundle key for a script declaration.
///
/// - Global bundles are keyed by the bundle name alone (default `index`).
/// - Component bundles are keyed `{owner}.{bundle_name}`.
pub fn bundle_key(global_bundle: bool, bundle_name: Option<&str>, owner: &str) -> String {
    let name = bundle_name.unwrap_or(GLOBAL_INDEX);
    if global_bundle {
        name.to_string()
    } else {
        format!("{owner}{KEY_SEPARATOR}{name}")
    }
}

/// File name of the emitted bundle for a key: `{key}.g.js`.
pub fn bundle_file_name(key: &str) -> String {
    format!("{key}.g.{SCRIPT_EXT}")
}

/// Qualified identity of a component: `{namespace}.{name}`, or just the name
/// for components declared outside a namespace.
pub fn owner_identity(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{ns}{KEY_SEPARATOR}{name}"),
        _ => name.to_string(),
    }
}

// ---------------------------------------------------------------------------
// JS Class Names
// ---------------------------------------------------------------------------

static NON_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_$]").unwrap());

/// Derive the synthetic JS class name for a component.
///
/// `App.Pages` + `Widget` becomes `App_Pages_Widget`. Characters that cannot
/// appear in a JS identifier are replaced by `_`.
pub fn js_class_name(namespace: Option<&str>, name: &str) -> String {
    let raw = match namespace {
        Some(ns) if !ns.is_empty() => format!("{ns}_{name}"),
        _ => name.to_string(),
    };
    let mut sanitized = NON_IDENT.replace_all(&raw, "_").into_owned();
    if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        sanitized.insert(0, '_');
    }
    sanitized
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
