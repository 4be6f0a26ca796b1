//! BlockPipeline - main entry point for block resolution.
//!
//! Owns the catalog, the interpolator registry and the host collaborators,
//! and exposes the operations the surrounding application consumes:
//! page/block resolution, the capability-gated placeholder and media
//! wrappers, rendering, and catalog pass-throughs.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use interpolator::{
    builtin_registry, fetch_interpolated_data, ContentSource, InterpolatorRegistry,
};
use placeholder::ContextData;

use crate::builtin::builtin_definitions;
use crate::capability::{MediaCapability, PlaceholderPolicy};
use crate::catalog::BlockCatalog;
use crate::component::BlockComponent;
use crate::config::PipelineConfig;
use crate::definition::BlockDefinition;
use crate::envelope::{
    flatten_runtime, BlockInstance, EnvelopeBuilder, ResolvedBlock, RuntimeEnvelope,
};
use crate::media::{resolve_media, ImageService, MediaError};
use crate::schema::FormConfig;

/// Main entry point for the block pipeline.
///
/// Constructed once per process with the host's content source and image
/// service; everything per-request flows through `ContextData` arguments.
pub struct BlockPipeline {
    config: PipelineConfig,
    catalog: Arc<BlockCatalog>,
    registry: Arc<InterpolatorRegistry>,
    images: Arc<dyn ImageService>,
    builder: EnvelopeBuilder,
}

impl BlockPipeline {
    /// Create a pipeline with default configuration.
    pub fn new(source: Arc<dyn ContentSource>, images: Arc<dyn ImageService>) -> Self {
        Self::with_config(source, images, PipelineConfig::default())
    }

    /// Create a pipeline with explicit configuration.
    pub fn with_config(
        source: Arc<dyn ContentSource>,
        images: Arc<dyn ImageService>,
        config: PipelineConfig,
    ) -> Self {
        info!(
            dev_mode = config.dev_mode,
            page_size = config.site.page_size,
            "Initializing block pipeline"
        );

        let registry = Arc::new(builtin_registry(source.clone(), config.site.page_size));
        let catalog = Arc::new(BlockCatalog::with_definitions(
            builtin_definitions(source, registry.clone(), &config),
            config.dev_mode,
        ));
        let builder = EnvelopeBuilder::new(catalog.clone(), registry.clone(), images.clone())
            .with_max_concurrency(config.resolver.max_concurrent_blocks);

        Self {
            config,
            catalog,
            registry,
            images,
            builder,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The catalog, for hosts that manage definitions directly.
    pub fn catalog(&self) -> &Arc<BlockCatalog> {
        &self.catalog
    }

    /// The interpolator registry, for hosts registering custom
    /// interpolators.
    pub fn registry(&self) -> &Arc<InterpolatorRegistry> {
        &self.registry
    }

    /// Register an additional (plugin) block type.
    pub async fn register_block(&self, definition: BlockDefinition) {
        debug!(block_type = %definition.block_type, "Registering block type");
        self.catalog.register(definition).await;
    }

    /// Resolve every block of a page, preserving order, isolating failures
    /// per block.
    pub async fn resolve_page(
        &self,
        instances: &[BlockInstance],
        context: &ContextData,
    ) -> Vec<ResolvedBlock> {
        self.builder.resolve_page(instances, context).await
    }

    /// Resolve one block instance.
    pub async fn resolve_block(
        &self,
        instance: &BlockInstance,
        context: &ContextData,
    ) -> RuntimeEnvelope {
        self.builder.resolve_block(instance, context).await
    }

    /// Batch-resolve every placeholder in a content tree. Never fails.
    pub async fn fetch_block_interpolated_data(
        &self,
        content: &Value,
        context: Option<&ContextData>,
    ) -> Map<String, Value> {
        fetch_interpolated_data(&self.registry, content, context).await
    }

    /// Resolve declared media fields of a content tree.
    pub async fn resolve_block_media(
        &self,
        content: &Value,
        capabilities: &[MediaCapability],
    ) -> Result<Map<String, Value>, MediaError> {
        resolve_media(self.images.as_ref(), content, capabilities).await
    }

    /// Capability-gated placeholder resolution: a disabled policy yields an
    /// empty map, and context only attaches when the policy says so.
    pub async fn resolve_block_placeholders(
        &self,
        content: &Value,
        context: Option<&ContextData>,
        policy: &PlaceholderPolicy,
    ) -> Map<String, Value> {
        if !policy.enabled {
            return Map::new();
        }
        let attach = if policy.with_context { context } else { None };
        fetch_interpolated_data(&self.registry, content, attach).await
    }

    /// Resolve and render one block to an HTML fragment. `None` for unknown
    /// block types.
    pub async fn render_block(
        &self,
        instance: &BlockInstance,
        context: &ContextData,
    ) -> Option<String> {
        let component = self.catalog.load_block_component(&instance.block_type).await?;
        let runtime = self.builder.resolve_block(instance, context).await;
        Some(component.render(&instance.content, &runtime))
    }

    /// The flattened runtime map handed to a rendering layer.
    pub fn block_runtime_data(envelope: &RuntimeEnvelope) -> Map<String, Value> {
        flatten_runtime(envelope)
    }

    /// Editing schema for one block type.
    pub async fn get_block_form_config(&self, block_type: &str) -> Option<Arc<FormConfig>> {
        self.catalog.get_block_schema(block_type).await
    }

    /// Editing schemas for every registered type.
    pub async fn get_all_block_form_configs(&self) -> Vec<Arc<FormConfig>> {
        self.catalog.get_all_block_schemas().await
    }

    /// Renderable component for one block type.
    pub async fn load_block_component(&self, block_type: &str) -> Option<Arc<dyn BlockComponent>> {
        self.catalog.load_block_component(block_type).await
    }

    /// All registered block types, sorted.
    pub async fn registered_block_types(&self) -> Vec<String> {
        self.catalog.registered_block_types().await
    }

    /// Cache tags for the block types appearing on a page.
    pub async fn cache_tags_for(&self, block_types: &[String]) -> Vec<String> {
        self.catalog.cache_tags_for(block_types).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ResolutionStatus;
    use crate::error::ResolveStage;
    use crate::media::MockImageService;
    use interpolator::{MockContentSource, PostSummary};
    use serde_json::json;

    fn seeded_pipeline() -> BlockPipeline {
        use chrono::TimeZone;
        let newer = chrono::Utc.with_ymd_and_hms(2026, 1, 2, 12, 0, 0).unwrap();
        let older = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let source = Arc::new(
            MockContentSource::new()
                .with_post(PostSummary::new("hello-world", "Hello world").with_published_at(newer))
                .with_post(PostSummary::new("second", "Second post").with_published_at(older))
                .with_tag("rust", "Rust", 45),
        );
        let images = Arc::new(MockImageService::new().with_image("hero.jpg", 1200, 630));
        BlockPipeline::new(source, images)
    }

    fn sample_page() -> Vec<BlockInstance> {
        vec![
            BlockInstance::new(
                1,
                "hero",
                json!({ "title": "Welcome to all {posts}", "image": "hero.jpg" }),
            ),
            BlockInstance::new(2, "postsList", json!({ "heading": "Latest", "limit": 2 })),
            BlockInstance::new(3, "made-up", json!({})),
            BlockInstance::new(4, "tabs", json!({ "tabs": [] })).with_enabled(false),
        ]
    }

    #[tokio::test]
    async fn test_resolve_page_statuses_and_order() {
        let pipeline = seeded_pipeline();
        let context = ContextData::new().with_url("/");

        let resolved = pipeline.resolve_page(&sample_page(), &context).await;

        assert_eq!(resolved.len(), 4);
        assert_eq!(resolved[0].instance.block_type, "hero");
        assert_eq!(resolved[0].runtime.meta.status, ResolutionStatus::Resolved);
        assert_eq!(resolved[1].runtime.meta.status, ResolutionStatus::Resolved);
        // Unknown type and disabled instance are skipped, not errors.
        assert_eq!(resolved[2].runtime.meta.status, ResolutionStatus::Skipped);
        assert_eq!(resolved[3].runtime.meta.status, ResolutionStatus::Skipped);

        // All envelopes belong to the same resolution pass.
        let pass_id = &resolved[0].runtime.meta.pass_id;
        assert!(resolved.iter().all(|b| &b.runtime.meta.pass_id == pass_id));
    }

    #[tokio::test]
    async fn test_hero_envelope_sections() {
        let pipeline = seeded_pipeline();
        let instance = &sample_page()[0];

        let envelope = pipeline.resolve_block(instance, &ContextData::new()).await;

        // Placeholder stage resolved {posts}; media stage resolved the image.
        assert_eq!(envelope.placeholders.get("postCount"), Some(&json!(2)));
        let image = envelope.media.get("imageData").unwrap();
        assert_eq!(image.get("width"), Some(&json!(1200)));
        assert!(envelope.business.is_empty());
    }

    #[tokio::test]
    async fn test_posts_list_business_data_wins_merge() {
        let pipeline = seeded_pipeline();
        let instance = BlockInstance::new(9, "postsList", json!({ "limit": 1 }));
        let context = ContextData::new().with_page(1);

        let envelope = pipeline.resolve_block(&instance, &context).await;
        let flat = BlockPipeline::block_runtime_data(&envelope);

        assert_eq!(flat.get("page"), Some(&json!(1)));
        let posts = flat.get("postsList").and_then(Value::as_array).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].get("slug"), Some(&json!("hello-world")));
    }

    #[tokio::test]
    async fn test_failing_fetcher_isolated_to_its_block() {
        let source = Arc::new(MockContentSource::new().with_available(false));
        let images = Arc::new(MockImageService::new());
        let pipeline = BlockPipeline::new(source, images);

        let page = vec![
            BlockInstance::new(1, "tabs", json!({ "tabs": [] })),
            BlockInstance::new(2, "friendLinks", json!({})),
        ];
        let resolved = pipeline.resolve_page(&page, &ContextData::new()).await;

        assert_eq!(resolved[0].runtime.meta.status, ResolutionStatus::Resolved);
        assert_eq!(resolved[1].runtime.meta.status, ResolutionStatus::Error);
        let error = resolved[1].runtime.meta.error.as_ref().unwrap();
        assert_eq!(error.stage, ResolveStage::BusinessFetch);
        assert_eq!(error.block_type, "friendLinks");
        assert_eq!(error.block_id, "2");
        assert!(resolved[1].runtime.business.is_empty());
    }

    #[tokio::test]
    async fn test_placeholder_wrapper_is_capability_gated() {
        let pipeline = seeded_pipeline();
        let content = json!("{posts}");

        let disabled = PlaceholderPolicy::default();
        let data = pipeline
            .resolve_block_placeholders(&content, None, &disabled)
            .await;
        assert!(data.is_empty());

        let enabled = PlaceholderPolicy {
            enabled: true,
            ..Default::default()
        };
        let data = pipeline
            .resolve_block_placeholders(&content, None, &enabled)
            .await;
        assert_eq!(data.get("postCount"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_render_block_html() {
        let pipeline = seeded_pipeline();
        let instance = BlockInstance::new(
            1,
            "hero",
            json!({ "title": "Hello & welcome", "image": "hero.jpg" }),
        );

        let html = pipeline
            .render_block(&instance, &ContextData::new())
            .await
            .unwrap();

        assert!(html.contains("Hello &amp; welcome"));
        assert!(html.contains(r#"src="hero.jpg""#));
        assert!(pipeline
            .render_block(
                &BlockInstance::new(2, "made-up", json!({})),
                &ContextData::new()
            )
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_cache_tags_for_page() {
        let pipeline = seeded_pipeline();
        let tags = pipeline
            .cache_tags_for(&[
                "postsList".to_string(),
                "pagination".to_string(),
                "friendLinks".to_string(),
            ])
            .await;
        assert_eq!(tags, vec!["posts", "links"]);
    }

    #[tokio::test]
    async fn test_form_config_lookup() {
        let pipeline = seeded_pipeline();
        let form = pipeline.get_block_form_config("hero").await.unwrap();
        assert_eq!(form.block_type, "hero");
        assert!(pipeline.get_block_form_config("made-up").await.is_none());

        let all = pipeline.get_all_block_form_configs().await;
        assert_eq!(all.len(), 6);
    }
}
