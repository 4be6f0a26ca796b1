//! Editing-form schemas for block types.
//!
//! A `FormConfig` is what the admin editor renders for a block type. The
//! pipeline only loads and caches these; interpreting them is the editor's
//! job.

use serde::{Deserialize, Serialize};

/// Kind of an editing-form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text
    Text,
    /// Multi-line rich text, may contain placeholder tokens
    RichText,
    /// Single image URL
    Image,
    /// List of image URLs
    ImageList,
    /// Numeric input
    Number,
    /// Boolean toggle
    Toggle,
    /// One of a fixed set of options
    Select { options: Vec<String> },
}

/// One field of a block's editing form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    /// Content key the field edits
    pub name: String,
    /// Label shown to the author
    pub label: String,
    /// Input kind
    pub kind: FieldKind,
    /// Whether the editor requires a value
    pub required: bool,
}

impl FormField {
    /// Create a field of the given kind.
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
        }
    }

    /// Shorthand for a text field.
    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    /// Shorthand for a rich-text field.
    pub fn rich_text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::RichText)
    }

    /// Mark the field required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// The editing form of one block type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Block type the form belongs to
    pub block_type: String,
    /// Form title shown in the editor
    pub label: String,
    /// Ordered fields
    pub fields: Vec<FormField>,
}

impl FormConfig {
    /// Create an empty form.
    pub fn new(block_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            label: label.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field.
    pub fn with_field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_builder() {
        let form = FormConfig::new("hero", "Hero banner")
            .with_field(FormField::text("title", "Title").required())
            .with_field(FormField::new("image", "Image", FieldKind::Image));

        assert_eq!(form.fields.len(), 2);
        assert!(form.fields[0].required);
        assert_eq!(form.fields[1].kind, FieldKind::Image);
    }
}
