//! The renderable side of a block type.

use serde_json::{Map, Value};

use crate::envelope::RuntimeEnvelope;

/// A server-renderable block component.
///
/// Components consume the stored content plus the resolved runtime envelope
/// and produce an HTML fragment. They hold no state and perform no I/O;
/// everything dynamic was resolved into the envelope beforehand.
pub trait BlockComponent: Send + Sync {
    /// Block type this component renders.
    fn block_type(&self) -> &str;

    /// Render one block instance to an HTML fragment.
    fn render(&self, content: &Value, runtime: &RuntimeEnvelope) -> String;
}

/// Read a string field out of a flattened runtime map, empty when missing.
pub(crate) fn text_field<'a>(data: &'a Map<String, Value>, key: &str) -> &'a str {
    data.get(key).and_then(Value::as_str).unwrap_or("")
}
