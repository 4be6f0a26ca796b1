//! Block type definitions and deferred loading.
//!
//! A [`BlockDefinition`] is static, declarative data registered once per
//! block type: capability descriptor, cache tags, and deferred loaders for
//! the editing schema and the renderable component. Loaders keep unused
//! block types cheap - a type nobody renders never constructs its component
//! or schema.

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::capability::Capabilities;
use crate::component::BlockComponent;
use crate::fetcher::Fetcher;
use crate::schema::FormConfig;

type FactoryFn<T> = dyn Fn() -> BoxFuture<'static, T> + Send + Sync;

/// An async factory invoked on first use and memoized afterwards.
///
/// Concurrent first uses race benignly; one result wins and later calls see
/// the memoized value.
pub struct Loader<T: Clone + Send + 'static> {
    factory: Box<FactoryFn<T>>,
    cell: OnceCell<T>,
}

impl<T: Clone + Send + 'static> Loader<T> {
    /// Wrap an async factory.
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        Self {
            factory: Box::new(move || Box::pin(factory())),
            cell: OnceCell::new(),
        }
    }

    /// Wrap an already-available value.
    pub fn ready(value: T) -> Self {
        Self {
            factory: Box::new(|| unreachable!("ready loader is never invoked")),
            cell: OnceCell::new_with(Some(value)),
        }
    }

    /// Load (once) and return the value.
    pub async fn get(&self) -> T {
        self.cell.get_or_init(|| (self.factory)()).await.clone()
    }

    /// Whether the factory has already run.
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}

/// The static definition of one block type.
///
/// Immutable after registration; owned by the catalog.
pub struct BlockDefinition {
    /// Type discriminator, e.g. `hero`
    pub block_type: String,
    /// Definition version, bumped on breaking content-shape changes
    pub version: u32,
    /// Declared optional processing
    pub capabilities: Capabilities,
    /// Cache tags invalidating pages that show this block
    pub cache_tags: Vec<String>,
    schema: Loader<Arc<FormConfig>>,
    component: Loader<Arc<dyn BlockComponent>>,
    fetcher: Option<Arc<dyn Fetcher>>,
}

impl BlockDefinition {
    /// Create a definition with deferred schema and component loaders.
    pub fn new(
        block_type: impl Into<String>,
        schema: Loader<Arc<FormConfig>>,
        component: Loader<Arc<dyn BlockComponent>>,
    ) -> Self {
        Self {
            block_type: block_type.into(),
            version: 1,
            capabilities: Capabilities::default(),
            cache_tags: Vec::new(),
            schema,
            component,
            fetcher: None,
        }
    }

    /// Set the definition version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Set the capability descriptor.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set cache tags.
    pub fn with_cache_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.cache_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a business-data fetcher.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Load (once) the editing schema.
    pub async fn schema(&self) -> Arc<FormConfig> {
        self.schema.get().await
    }

    /// Load (once) the renderable component.
    pub async fn component(&self) -> Arc<dyn BlockComponent> {
        self.component.get().await
    }

    /// The block type's fetcher, if it declares one.
    pub fn fetcher(&self) -> Option<Arc<dyn Fetcher>> {
        self.fetcher.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_loader_memoizes() {
        static RUNS: AtomicU32 = AtomicU32::new(0);

        let loader = Loader::new(|| async {
            RUNS.fetch_add(1, Ordering::SeqCst);
            42u32
        });

        assert!(!loader.is_loaded());
        assert_eq!(loader.get().await, 42);
        assert_eq!(loader.get().await, 42);
        assert_eq!(RUNS.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ready_loader() {
        let loader = Loader::ready("static".to_string());
        assert!(loader.is_loaded());
        assert_eq!(loader.get().await, "static");
    }
}
