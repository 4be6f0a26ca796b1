//! The block catalog - process-wide registry of block definitions.
//!
//! Definitions are registered once (builtins at construction, plugins via
//! [`BlockCatalog::register`]) and read concurrently for the process
//! lifetime. A small cache in front of the schema loaders remembers
//! resolved schemas; in dev mode the cache is bypassed so schema edits show
//! up without a restart. Unknown block types are a warning-and-`None`
//! no-op, never an error, so a page holding a stale type still renders the
//! rest of its blocks.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::component::BlockComponent;
use crate::definition::BlockDefinition;
use crate::schema::FormConfig;

/// Process-wide registry of block definitions keyed by type.
pub struct BlockCatalog {
    definitions: RwLock<HashMap<String, Arc<BlockDefinition>>>,
    schema_cache: DashMap<String, Arc<FormConfig>>,
    dev_mode: bool,
}

impl BlockCatalog {
    /// Create an empty catalog.
    pub fn new(dev_mode: bool) -> Self {
        Self {
            definitions: RwLock::new(HashMap::new()),
            schema_cache: DashMap::new(),
            dev_mode,
        }
    }

    /// Create a catalog pre-populated with definitions.
    pub fn with_definitions(
        definitions: impl IntoIterator<Item = BlockDefinition>,
        dev_mode: bool,
    ) -> Self {
        Self {
            definitions: RwLock::new(
                definitions
                    .into_iter()
                    .map(|definition| (definition.block_type.clone(), Arc::new(definition)))
                    .collect(),
            ),
            schema_cache: DashMap::new(),
            dev_mode,
        }
    }

    /// Register a block definition, replacing any previous definition of
    /// the same type.
    pub async fn register(&self, definition: BlockDefinition) {
        let block_type = definition.block_type.clone();
        self.schema_cache.remove(&block_type);
        let mut definitions = self.definitions.write().await;
        definitions.insert(block_type, Arc::new(definition));
    }

    /// Look up a definition. Unknown types log a warning in debug builds
    /// and return `None`.
    pub async fn definition(&self, block_type: &str) -> Option<Arc<BlockDefinition>> {
        let definitions = self.definitions.read().await;
        let found = definitions.get(block_type).cloned();
        if found.is_none() && cfg!(debug_assertions) {
            warn!(block_type = %block_type, "Unknown block type");
        }
        found
    }

    /// Load (and outside dev mode, cache) the editing schema of a type.
    ///
    /// Concurrent first loads may race to populate the cache; loading is
    /// idempotent, so the duplicate work is harmless and one result wins.
    pub async fn get_block_schema(&self, block_type: &str) -> Option<Arc<FormConfig>> {
        if !self.dev_mode {
            if let Some(hit) = self.schema_cache.get(block_type) {
                return Some(hit.clone());
            }
        }

        let definition = self.definition(block_type).await?;
        let schema = definition.schema().await;
        if !self.dev_mode {
            self.schema_cache
                .insert(block_type.to_string(), schema.clone());
        }
        Some(schema)
    }

    /// Schemas of every registered type, sorted by type.
    pub async fn get_all_block_schemas(&self) -> Vec<Arc<FormConfig>> {
        let mut schemas = Vec::new();
        for block_type in self.registered_block_types().await {
            if let Some(schema) = self.get_block_schema(&block_type).await {
                schemas.push(schema);
            }
        }
        schemas
    }

    /// Load the renderable component of a type.
    pub async fn load_block_component(&self, block_type: &str) -> Option<Arc<dyn BlockComponent>> {
        let definition = self.definition(block_type).await?;
        Some(definition.component().await)
    }

    /// All registered block types, sorted.
    pub async fn registered_block_types(&self) -> Vec<String> {
        let definitions = self.definitions.read().await;
        let mut types: Vec<_> = definitions.keys().cloned().collect();
        types.sort();
        types
    }

    /// Union of the cache tags of the given types, deduplicated in
    /// first-seen order. Unknown types contribute nothing.
    pub async fn cache_tags_for(&self, block_types: &[String]) -> Vec<String> {
        let definitions = self.definitions.read().await;
        let mut tags = Vec::new();
        for block_type in block_types {
            if let Some(definition) = definitions.get(block_type) {
                for tag in &definition.cache_tags {
                    if !tags.contains(tag) {
                        tags.push(tag.clone());
                    }
                }
            }
        }
        tags
    }

    /// Drop every cached schema. Used by tests and dev tooling.
    pub fn clear_schema_cache(&self) {
        self.schema_cache.clear();
    }

    /// Whether the cache is bypassed for hot-reload.
    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }
}
