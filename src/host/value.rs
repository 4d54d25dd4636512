//! Host-side diagnostic records built from guest reports.

use probe_core::{Frame, Trap};
use serde::Serialize;

/// What a reported value describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    Null,
    Number,
    String,
    Reference,
    Truthy,
    Falsy,
    Finite,
}

/// A reported actual/expected value or a logged value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActualValue {
    pub kind: ValueKind,
    /// Human-readable rendering of the value.
    pub message: String,
    /// Guest stack at the time of the report, engine frames removed.
    pub stack: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<u32>,
    /// Byte length of a reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    /// Bytes copied out of guest memory for references.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,
    pub negated: bool,
}

impl ActualValue {
    pub fn new(kind: ValueKind, message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: stack.into(),
            value: None,
            pointer: None,
            offset: None,
            bytes: None,
            negated: false,
        }
    }

    pub fn with_negated(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_pointer(mut self, pointer: u32) -> Self {
        self.pointer = Some(pointer);
        self
    }

    pub fn with_reference(mut self, pointer: u32, bytes: Vec<u8>) -> Self {
        self.pointer = Some(pointer);
        self.offset = u32::try_from(bytes.len()).ok();
        self.bytes = Some(bytes);
        self
    }
}

/// Render a guest number the way a guest would print it (`2`, `0.5`, `Infinity`, `NaN`).
pub fn format_number(value: f64) -> String {
    if value.is_infinite() {
        if value > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else {
        value.to_string()
    }
}

/// Render a shadow stack innermost-first, without engine-internal frames.
pub fn render_stack(frames: &[Frame]) -> String {
    frames
        .iter()
        .rev()
        .filter(|frame| !frame.internal)
        .map(|frame| format!("    at {}", frame.function))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a trap as an error stack: the trap message followed by its filtered frames.
pub fn render_error_stack(trap: &Trap) -> String {
    let frames = render_stack(trap.frames());
    if frames.is_empty() {
        trap.to_string()
    } else {
        format!("{trap}\n{frames}")
    }
}
