//! Declarative block capabilities.
//!
//! A block definition declares up front which optional processing it needs:
//! context inheritance, placeholder resolution over its content, and media
//! fields to enrich with image metadata. The envelope builder reads these
//! flags; block code never re-implements the plumbing.

use serde::{Deserialize, Serialize};

/// How a block receives ambient page context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    /// The page's `ContextData` flows into the block's envelope and fetcher
    Inherit,
    /// The block is context-free
    None,
}

/// Where placeholder text is scanned from. Only block content today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderSource {
    Content,
}

/// Placeholder-resolution policy for a block type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderPolicy {
    /// Whether the placeholders stage runs at all
    pub enabled: bool,
    /// What is scanned for placeholder tokens
    pub source: PlaceholderSource,
    /// Whether ambient context is folded into placeholder params
    pub with_context: bool,
}

impl Default for PlaceholderPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            source: PlaceholderSource::Content,
            with_context: false,
        }
    }
}

/// Kind of media field a capability describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    /// A single image URL string
    Image,
    /// An array of image URL strings
    ImageArray,
}

/// One media field of a block's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCapability {
    /// Dot-separated path into the block content to read from
    pub path: String,
    /// Single image or image array
    pub kind: MediaKind,
    /// Dot-separated path in the media result to write to.
    /// May equal `path` (overwrite) or differ (additive).
    pub output: String,
}

impl MediaCapability {
    /// Single image written back at the same path.
    pub fn image(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            output: path.clone(),
            path,
            kind: MediaKind::Image,
        }
    }

    /// Single image written to a different output path.
    pub fn image_at(path: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: MediaKind::Image,
            output: output.into(),
        }
    }

    /// Image array written back at the same path.
    pub fn image_array(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            output: path.clone(),
            path,
            kind: MediaKind::ImageArray,
        }
    }

    /// Image array written to a different output path.
    pub fn image_array_at(path: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: MediaKind::ImageArray,
            output: output.into(),
        }
    }
}

/// The full capability descriptor of a block type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Context propagation mode
    pub context: ContextMode,
    /// Placeholder policy
    pub placeholders: PlaceholderPolicy,
    /// Media fields to resolve
    pub media: Vec<MediaCapability>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            context: ContextMode::None,
            placeholders: PlaceholderPolicy::default(),
            media: Vec::new(),
        }
    }
}

impl Capabilities {
    /// Capability-free descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inherit the page context.
    pub fn inherit_context(mut self) -> Self {
        self.context = ContextMode::Inherit;
        self
    }

    /// Enable placeholder resolution over content.
    pub fn with_placeholders(mut self, with_context: bool) -> Self {
        self.placeholders = PlaceholderPolicy {
            enabled: true,
            source: PlaceholderSource::Content,
            with_context,
        };
        self
    }

    /// Declare a media field.
    pub fn with_media(mut self, capability: MediaCapability) -> Self {
        self.media.push(capability);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_accumulates() {
        let capabilities = Capabilities::new()
            .inherit_context()
            .with_placeholders(true)
            .with_media(MediaCapability::image_at("image", "imageData"));

        assert_eq!(capabilities.context, ContextMode::Inherit);
        assert!(capabilities.placeholders.enabled);
        assert!(capabilities.placeholders.with_context);
        assert_eq!(capabilities.media.len(), 1);
        assert_eq!(capabilities.media[0].output, "imageData");
    }

    #[test]
    fn test_same_path_output_overwrites_in_place() {
        let capability = MediaCapability::image("cover");
        assert_eq!(capability.path, capability.output);
    }
}
