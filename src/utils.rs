//! Utility functions for bundle emission.
//!
//! - Banner line construction
//! - Newline normalization (deterministic output across platforms)
//! - Class rendering with `globalThis` registration

use crate::ScriptFragment;

// ---------------------------------------------------------------------------
// Banner
// ---------------------------------------------------------------------------

/// Prefix of the first line of every emitted bundle.
pub const BANNER_PREFIX: &str = "// Auto-generated bundle: ";

/// Banner line (with trailing newline) naming the bundle key.
pub fn bundle_banner(key: &str) -> String {
    format!("{BANNER_PREFIX}{key}\n")
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Normalize CRLF / CR line endings to LF.
pub fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Indent every non-empty line by `width` spaces.
pub fn indent(s: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    s.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Class Rendering
// ---------------------------------------------------------------------------

/// How a wrapped class is exposed on `globalThis`.
///
/// Ordered so that the strongest request among several fragments wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GlobalRegistration {
    Unregistered,
    Class,
    Instance,
}

impl GlobalRegistration {
    /// Registration requested by one fragment. `AddAsInstance` beats `AddToGlobal`.
    pub fn of(fragment: &ScriptFragment) -> Self {
        if fragment.add_as_instance {
            Self::Instance
        } else if fragment.add_to_global {
            Self::Class
        } else {
            Self::Unregistered
        }
    }
}

/// Render `export class {class_name}` holding every member body, in order,
/// followed by the optional `globalThis` registration.
pub fn render_class(
    class_name: &str,
    members: &[&str],
    registration: GlobalRegistration,
) -> String {
    let body = members
        .iter()
        .map(|member| indent(&normalize_newlines(member), 4))
        .collect::<Vec<_>>()
        .join("\n");

    let mut out = format!("export class {class_name} {{\n{body}\n}}");
    match registration {
        GlobalRegistration::Instance => {
            out.push_str(&format!("\nglobalThis.{class_name} = new {class_name}();"))
        }
        GlobalRegistration::Class => {
            out.push_str(&format!("\nglobalThis.{class_name} = {class_name};"))
        }
        GlobalRegistration::Unregistered => {}
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
