//! Block instances, runtime envelopes, and the envelope builder.
//!
//! The builder is the core orchestrator: per block instance it runs
//! `definition-lookup → {placeholders, media} (parallel) → business-fetch →
//! merge`, catching failures per block so one bad block never takes down a
//! page.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use interpolator::{fetch_interpolated_data, InterpolatorRegistry};
use placeholder::ContextData;

use crate::capability::ContextMode;
use crate::catalog::BlockCatalog;
use crate::error::{BlockRuntimeError, ResolveStage};
use crate::media::{resolve_media, ImageService};
use crate::merge::flatten_sections;

/// Identifier of a block instance. Stored pages use integers; editor drafts
/// may use opaque strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockId {
    Int(i64),
    Str(String),
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Int(id) => write!(f, "{id}"),
            BlockId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for BlockId {
    fn from(id: i64) -> Self {
        BlockId::Int(id)
    }
}

impl From<i32> for BlockId {
    fn from(id: i32) -> Self {
        BlockId::Int(id.into())
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        BlockId::Str(id.to_string())
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        BlockId::Str(id)
    }
}

/// One entry in a page's ordered block list.
///
/// Only this struct is stored durably; the runtime envelope is rebuilt on
/// every resolution pass and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInstance {
    /// Instance id, unique within the page
    pub id: BlockId,
    /// Block type discriminator
    #[serde(rename = "block")]
    pub block_type: String,
    /// Author-edited content tree
    pub content: Value,
    /// Disabled instances are skipped during resolution
    pub enabled: bool,
}

impl BlockInstance {
    /// Create an enabled instance.
    pub fn new(id: impl Into<BlockId>, block_type: impl Into<String>, content: Value) -> Self {
        Self {
            id: id.into(),
            block_type: block_type.into(),
            content,
            enabled: true,
        }
    }

    /// Set the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Terminal state of one block's resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// All stages completed
    Resolved,
    /// Disabled instance or unknown block type; renders as empty
    Skipped,
    /// A stage failed; see the error marker
    Error,
}

/// Bookkeeping attached to every envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    /// Terminal state
    pub status: ResolutionStatus,
    /// When this pass resolved the block
    pub resolved_at: DateTime<Utc>,
    /// Id of the page-level resolution pass
    pub pass_id: String,
    /// Error marker when `status` is `Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BlockRuntimeError>,
}

impl EnvelopeMeta {
    fn new(status: ResolutionStatus, pass_id: &str) -> Self {
        Self {
            status,
            resolved_at: Utc::now(),
            pass_id: pass_id.to_string(),
            error: None,
        }
    }
}

/// The merged, per-render data object attached to a resolved block.
///
/// Sections merge with fixed precedence, later wins:
/// context → placeholders → media → business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeEnvelope {
    /// Ambient page context (when the block inherits it)
    pub context: Map<String, Value>,
    /// Batch-interpolated placeholder data
    pub placeholders: Map<String, Value>,
    /// Resolved media metadata
    pub media: Map<String, Value>,
    /// Block-type fetcher output
    pub business: Map<String, Value>,
    /// Resolution bookkeeping
    pub meta: EnvelopeMeta,
}

impl RuntimeEnvelope {
    fn skipped(pass_id: &str) -> Self {
        Self {
            context: Map::new(),
            placeholders: Map::new(),
            media: Map::new(),
            business: Map::new(),
            meta: EnvelopeMeta::new(ResolutionStatus::Skipped, pass_id),
        }
    }

    fn failed(
        pass_id: &str,
        context: Map<String, Value>,
        placeholders: Map<String, Value>,
        media: Map<String, Value>,
        error: BlockRuntimeError,
    ) -> Self {
        let mut meta = EnvelopeMeta::new(ResolutionStatus::Error, pass_id);
        meta.error = Some(error);
        Self {
            context,
            placeholders,
            media,
            business: Map::new(),
            meta,
        }
    }

    /// Whether the block resolved fully.
    pub fn is_resolved(&self) -> bool {
        self.meta.status == ResolutionStatus::Resolved
    }
}

/// Flatten an envelope into the single map handed to the rendering layer.
///
/// Merge precedence per the envelope contract: business wins over media
/// wins over placeholders wins over context.
pub fn flatten_runtime(envelope: &RuntimeEnvelope) -> Map<String, Value> {
    flatten_sections([
        &envelope.context,
        &envelope.placeholders,
        &envelope.media,
        &envelope.business,
    ])
}

/// A block instance together with its freshly built envelope.
#[derive(Debug, Clone)]
pub struct ResolvedBlock {
    /// The stored instance
    pub instance: BlockInstance,
    /// The envelope built by this pass
    pub runtime: RuntimeEnvelope,
}

/// Builds runtime envelopes for block instances.
pub struct EnvelopeBuilder {
    catalog: Arc<BlockCatalog>,
    registry: Arc<InterpolatorRegistry>,
    images: Arc<dyn ImageService>,
    max_concurrent: usize,
}

impl EnvelopeBuilder {
    /// Create a builder over the given collaborators.
    pub fn new(
        catalog: Arc<BlockCatalog>,
        registry: Arc<InterpolatorRegistry>,
        images: Arc<dyn ImageService>,
    ) -> Self {
        Self {
            catalog,
            registry,
            images,
            max_concurrent: 8,
        }
    }

    /// Bound how many blocks of one page resolve concurrently.
    pub fn with_max_concurrency(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Resolve every block of a page concurrently, preserving page order.
    ///
    /// Failure isolation is per block: a failing block comes back with an
    /// error marker while its neighbours resolve normally.
    pub async fn resolve_page(
        &self,
        instances: &[BlockInstance],
        context: &ContextData,
    ) -> Vec<ResolvedBlock> {
        let pass_id = uuid::Uuid::new_v4().to_string();
        debug!(pass_id = %pass_id, blocks = instances.len(), "Resolving page");

        let tasks = instances.iter().map(|instance| {
            let pass_id = pass_id.clone();
            async move {
                let runtime = self.resolve_instance(instance, context, &pass_id).await;
                ResolvedBlock {
                    instance: instance.clone(),
                    runtime,
                }
            }
        });
        stream::iter(tasks)
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    /// Resolve a single block instance.
    pub async fn resolve_block(
        &self,
        instance: &BlockInstance,
        context: &ContextData,
    ) -> RuntimeEnvelope {
        let pass_id = uuid::Uuid::new_v4().to_string();
        self.resolve_instance(instance, context, &pass_id).await
    }

    async fn resolve_instance(
        &self,
        instance: &BlockInstance,
        context: &ContextData,
        pass_id: &str,
    ) -> RuntimeEnvelope {
        if !instance.enabled {
            debug!(block_type = %instance.block_type, id = %instance.id, "Skipping disabled block");
            return RuntimeEnvelope::skipped(pass_id);
        }

        // definition-lookup; a miss is a terminal skip, not an error
        let definition = match self.catalog.definition(&instance.block_type).await {
            Some(definition) => definition,
            None => return RuntimeEnvelope::skipped(pass_id),
        };
        let capabilities = &definition.capabilities;

        let context_section = match capabilities.context {
            ContextMode::Inherit => context.to_section(),
            ContextMode::None => Map::new(),
        };

        // placeholders and media run concurrently; both finish before the
        // business fetch starts
        let placeholders_task = async {
            if capabilities.placeholders.enabled {
                let attach = capabilities.placeholders.with_context.then_some(context);
                fetch_interpolated_data(&self.registry, &instance.content, attach).await
            } else {
                Map::new()
            }
        };
        let media_task = async {
            if capabilities.media.is_empty() {
                Ok(Map::new())
            } else {
                resolve_media(self.images.as_ref(), &instance.content, &capabilities.media).await
            }
        };
        let (placeholders, media_outcome) = tokio::join!(placeholders_task, media_task);

        let media = match media_outcome {
            Ok(media) => media,
            Err(error) => {
                warn!(block_type = %instance.block_type, id = %instance.id, %error, "Media stage failed");
                let marker = BlockRuntimeError::new(
                    "media_error",
                    ResolveStage::Media,
                    &instance.block_type,
                    instance.id.to_string(),
                    "media resolution failed",
                )
                .with_cause(error);
                return RuntimeEnvelope::failed(
                    pass_id,
                    context_section,
                    placeholders,
                    Map::new(),
                    marker,
                );
            }
        };

        let business = match definition.fetcher() {
            Some(fetcher) => {
                let effective_context = match capabilities.context {
                    ContextMode::Inherit => context.clone(),
                    ContextMode::None => ContextData::new(),
                };
                match fetcher.fetch(&instance.content, &effective_context).await {
                    Ok(business) => business,
                    Err(error) => {
                        warn!(block_type = %instance.block_type, id = %instance.id, %error, "Business fetch failed");
                        let marker = BlockRuntimeError::new(
                            "source_error",
                            ResolveStage::BusinessFetch,
                            &instance.block_type,
                            instance.id.to_string(),
                            "business data fetch failed",
                        )
                        .with_cause(error);
                        return RuntimeEnvelope::failed(
                            pass_id,
                            context_section,
                            placeholders,
                            media,
                            marker,
                        );
                    }
                }
            }
            None => Map::new(),
        };

        RuntimeEnvelope {
            context: context_section,
            placeholders,
            media,
            business,
            meta: EnvelopeMeta::new(ResolutionStatus::Resolved, pass_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_id_display_and_serde() {
        assert_eq!(BlockId::from(7).to_string(), "7");
        assert_eq!(BlockId::from("draft-1").to_string(), "draft-1");

        let ids: Vec<BlockId> = serde_json::from_value(json!([3, "draft-1"])).unwrap();
        assert_eq!(ids, vec![BlockId::Int(3), BlockId::Str("draft-1".into())]);
    }

    #[test]
    fn test_flatten_precedence() {
        let envelope = RuntimeEnvelope {
            context: serde_json::from_value(json!({ "a": 1 })).unwrap(),
            placeholders: serde_json::from_value(json!({ "a": 2, "b": 2 })).unwrap(),
            media: serde_json::from_value(json!({ "b": 3, "c": 3 })).unwrap(),
            business: serde_json::from_value(json!({ "c": 4 })).unwrap(),
            meta: EnvelopeMeta::new(ResolutionStatus::Resolved, "pass"),
        };

        let flat = flatten_runtime(&envelope);
        assert_eq!(Value::Object(flat), json!({ "a": 2, "b": 3, "c": 4 }));
    }
}
