//! Media metadata resolution for declared block media fields.
//!
//! The pipeline never talks to a CDN or image store itself; the host
//! supplies an [`ImageService`] and the resolver enriches declared content
//! paths with width/height/blur metadata, writing results at each
//! capability's declared output path.

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

use crate::capability::{MediaCapability, MediaKind};

/// Error types for image metadata operations.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Image service is not reachable
    #[error("Image service unavailable: {0}")]
    Unavailable(String),

    /// Metadata fetch failed for one URL
    #[error("Metadata fetch failed for {url}: {message}")]
    FetchFailed { url: String, message: String },
}

/// Processed metadata for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedImage {
    /// Source URL
    pub url: String,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// Base64 blur placeholder, if the provider produced one
    pub blur_data: Option<String>,
}

/// The image-metadata collaborator supplied by the host application.
///
/// `Ok(None)` / an empty vec mean "could not resolve" and are the graceful
/// path; errors are reserved for the service itself failing.
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Metadata for a single image URL.
    async fn process_image_field(&self, url: &str) -> Result<Option<ProcessedImage>, MediaError>;

    /// Metadata for a batch of image URLs. Unresolvable URLs are dropped.
    async fn process_image_array_field(
        &self,
        urls: &[String],
    ) -> Result<Vec<ProcessedImage>, MediaError>;
}

/// Read the value at a dot-separated path inside a JSON tree.
pub fn value_at_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write a value at a dot-separated path, creating intermediate objects.
///
/// A non-object value sitting on an intermediate segment is overwritten by a
/// fresh object. Lossy, documented, not an error.
pub fn write_at_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return,
    };

    let mut current = target;
    for segment in parents {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot.as_object_mut() {
            Some(map) => map,
            None => return,
        };
    }
    current.insert(last.to_string(), value);
}

/// Resolve every declared media capability of a block concurrently.
///
/// Returns the media section of the runtime envelope: a map shaped by the
/// capabilities' output paths. Fields whose content value is missing, empty
/// or unresolvable contribute nothing; a failing service call fails the
/// stage (the envelope builder isolates it to the block).
pub async fn resolve_media(
    service: &dyn ImageService,
    content: &Value,
    capabilities: &[MediaCapability],
) -> Result<Map<String, Value>, MediaError> {
    let tasks = capabilities.iter().map(|capability| async move {
        let resolved = resolve_capability(service, content, capability).await?;
        Ok::<_, MediaError>(resolved.map(|value| (capability.output.clone(), value)))
    });

    let mut section = Map::new();
    for outcome in join_all(tasks).await {
        if let Some((output, value)) = outcome? {
            write_at_path(&mut section, &output, value);
        }
    }
    Ok(section)
}

async fn resolve_capability(
    service: &dyn ImageService,
    content: &Value,
    capability: &MediaCapability,
) -> Result<Option<Value>, MediaError> {
    let field = value_at_path(content, &capability.path);

    match capability.kind {
        MediaKind::Image => {
            let url = match field.and_then(Value::as_str) {
                Some(url) if !url.is_empty() => url,
                _ => return Ok(None),
            };
            let processed = service.process_image_field(url).await?;
            debug!(path = %capability.path, resolved = processed.is_some(), "Resolved image field");
            Ok(processed.map(|image| {
                serde_json::to_value(image).unwrap_or(Value::Null)
            }))
        }
        MediaKind::ImageArray => {
            let urls: Vec<String> = match field.and_then(Value::as_array) {
                Some(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string)
                    .collect(),
                None => return Ok(None),
            };
            if urls.is_empty() {
                return Ok(None);
            }

            let processed = service.process_image_array_field(&urls).await?;
            debug!(path = %capability.path, resolved = processed.len(), "Resolved image array field");
            // Only write when at least one image resolved.
            if processed.is_empty() {
                return Ok(None);
            }
            Ok(Some(serde_json::to_value(processed).unwrap_or(Value::Null)))
        }
    }
}

/// Mock image service for testing.
///
/// Knows metadata for seeded URLs only; everything else resolves to `None`.
pub struct MockImageService {
    images: HashMap<String, (u32, u32)>,
    call_count: AtomicU32,
}

impl MockImageService {
    /// Create an empty mock service.
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            call_count: AtomicU32::new(0),
        }
    }

    /// Seed metadata for a URL.
    pub fn with_image(mut self, url: impl Into<String>, width: u32, height: u32) -> Self {
        self.images.insert(url.into(), (width, height));
        self
    }

    /// Number of service calls made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    fn lookup(&self, url: &str) -> Option<ProcessedImage> {
        self.images.get(url).map(|&(width, height)| ProcessedImage {
            url: url.to_string(),
            width,
            height,
            blur_data: Some(format!("blur:{url}")),
        })
    }
}

impl Default for MockImageService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageService for MockImageService {
    async fn process_image_field(&self, url: &str) -> Result<Option<ProcessedImage>, MediaError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.lookup(url))
    }

    async fn process_image_array_field(
        &self,
        urls: &[String],
    ) -> Result<Vec<ProcessedImage>, MediaError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(urls.iter().filter_map(|url| self.lookup(url)).collect())
    }
}
