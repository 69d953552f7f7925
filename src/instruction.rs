//! Flattened render instructions produced by the host component compiler.
//!
//! The extractor never sees source text. It walks this linear stream the same
//! way the host renderer would, so every structural construct the compiler
//! emits shows up here as one instruction.

use serde::{Deserialize, Serialize};

/// One structural instruction of a component's render logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Opens a child component of the given (fully-qualified) type.
    OpenComponent {
        #[serde(default)]
        sequence: u32,
        component: String,
    },
    /// Closes the most recently opened component.
    CloseComponent,
    /// Sets a parameter on the currently open component.
    AddComponentParameter {
        #[serde(default)]
        sequence: u32,
        name: String,
        value: Value,
    },
    /// Raw markup content.
    AddMarkupContent {
        #[serde(default)]
        sequence: u32,
        content: Value,
    },
    /// Text content.
    AddContent {
        #[serde(default)]
        sequence: u32,
        content: Value,
    },
    OpenElement {
        #[serde(default)]
        sequence: u32,
        element: String,
    },
    CloseElement,
    AddAttribute {
        #[serde(default)]
        sequence: u32,
        name: String,
        value: Value,
    },
}

impl Instruction {
    /// Content carried by a markup or text instruction.
    pub fn content(&self) -> Option<&Value> {
        match self {
            Instruction::AddMarkupContent { content, .. } | Instruction::AddContent { content, .. } => {
                Some(content)
            }
            _ => None,
        }
    }

    /// `(name, value)` of a component parameter instruction.
    pub fn parameter(&self) -> Option<(&str, &Value)> {
        match self {
            Instruction::AddComponentParameter { name, value, .. } => Some((name.as_str(), value)),
            _ => None,
        }
    }

    pub fn is_close_component(&self) -> bool {
        matches!(self, Instruction::CloseComponent)
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A value passed to an instruction: either a literal the compiler could fold,
/// or a computed expression that is only known at run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Literal(Literal),
    /// Source text of the expression, kept for diagnostics only.
    Computed(String),
}

impl Value {
    pub fn literal(&self) -> Option<&Literal> {
        match self {
            Value::Literal(lit) => Some(lit),
            Value::Computed(_) => None,
        }
    }

    /// Literal text, if this is a string literal.
    pub fn literal_text(&self) -> Option<&str> {
        match self {
            Value::Literal(Literal::Str(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Literal(Literal::Str(s.to_string()))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Literal(Literal::Bool(b))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Literal {
    /// Coerce to a bool. Accepts bool literals and `"true"`/`"false"` strings.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(b) => Some(*b),
            Literal::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Coerce to a string. `null` has no text.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Literal::Null => None,
            Literal::Bool(b) => Some(b.to_string()),
            Literal::Int(i) => Some(i.to_string()),
            Literal::Float(f) => Some(f.to_string()),
            Literal::Str(s) => Some(s.clone()),
        }
    }
}
