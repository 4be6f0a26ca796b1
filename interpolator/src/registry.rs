//! Registry of interpolators keyed by placeholder name.
//!
//! Interpolators are registered behind lazy loaders so that a placeholder
//! name nobody uses never constructs its interpolator (or touches its data
//! source). A loader runs at most once; the result is memoized for the
//! registry's lifetime.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};

use crate::source::SourceError;

/// An async producer of data for one placeholder name.
#[async_trait]
pub trait Interpolator: Send + Sync {
    /// Placeholder name this interpolator answers to.
    fn name(&self) -> &str;

    /// Produce the data map for one placeholder occurrence.
    ///
    /// Parameters are the placeholder's own params unioned with ambient
    /// context (explicit params first).
    async fn resolve(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<Map<String, Value>, SourceError>;
}

type LoaderFn = dyn Fn() -> BoxFuture<'static, Arc<dyn Interpolator>> + Send + Sync;

/// A deferred interpolator: an async factory invoked on first use and
/// memoized afterwards.
pub struct LazyInterpolator {
    loader: Box<LoaderFn>,
    cell: OnceCell<Arc<dyn Interpolator>>,
}

impl LazyInterpolator {
    /// Wrap an async factory. The factory runs at most once; concurrent
    /// first lookups race benignly and one result wins.
    pub fn new<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Arc<dyn Interpolator>> + Send + 'static,
    {
        Self {
            loader: Box::new(move || Box::pin(loader())),
            cell: OnceCell::new(),
        }
    }

    /// Wrap an already-constructed interpolator.
    pub fn eager(interpolator: Arc<dyn Interpolator>) -> Self {
        Self {
            loader: Box::new(|| unreachable!("eager loader is never invoked")),
            cell: OnceCell::new_with(Some(interpolator)),
        }
    }

    /// Load (once) and return the interpolator.
    pub async fn get(&self) -> Arc<dyn Interpolator> {
        self.cell.get_or_init(|| (self.loader)()).await.clone()
    }

    /// Whether the loader has already run.
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}

/// Registry mapping placeholder names to lazily loaded interpolators.
pub struct InterpolatorRegistry {
    entries: RwLock<HashMap<String, Arc<LazyInterpolator>>>,
}

impl InterpolatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry pre-populated with entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, LazyInterpolator)>) -> Self {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(name, lazy)| (name, Arc::new(lazy)))
                    .collect(),
            ),
        }
    }

    /// Register an interpolator behind a lazy loader.
    pub async fn register(&self, name: impl Into<String>, lazy: LazyInterpolator) {
        let mut entries = self.entries.write().await;
        entries.insert(name.into(), Arc::new(lazy));
    }

    /// Register an already-constructed interpolator under its own name.
    pub async fn register_eager(&self, interpolator: Arc<dyn Interpolator>) {
        let name = interpolator.name().to_string();
        self.register(name, LazyInterpolator::eager(interpolator))
            .await;
    }

    /// Whether a name is registered.
    pub async fn contains(&self, name: &str) -> bool {
        self.entries.read().await.contains_key(name)
    }

    /// All registered placeholder names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.entries.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up an interpolator, loading it on first use.
    ///
    /// Returns `None` for unknown names; the caller decides whether that is
    /// worth a warning.
    pub async fn lookup(&self, name: &str) -> Option<Arc<dyn Interpolator>> {
        let lazy = {
            let entries = self.entries.read().await;
            entries.get(name).cloned()
        };
        match lazy {
            Some(lazy) => Some(lazy.get().await),
            None => None,
        }
    }
}

impl Default for InterpolatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StaticInterpolator {
        name: &'static str,
        key: &'static str,
        value: i64,
    }

    #[async_trait]
    impl Interpolator for StaticInterpolator {
        fn name(&self) -> &str {
            self.name
        }

        async fn resolve(
            &self,
            _params: &HashMap<String, String>,
        ) -> Result<Map<String, Value>, SourceError> {
            let mut map = Map::new();
            map.insert(self.key.to_string(), Value::from(self.value));
            Ok(map)
        }
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = InterpolatorRegistry::new();
        registry
            .register_eager(Arc::new(StaticInterpolator {
                name: "posts",
                key: "postCount",
                value: 3,
            }))
            .await;

        assert!(registry.contains("posts").await);
        assert!(registry.lookup("nope").await.is_none());

        let interpolator = registry.lookup("posts").await.unwrap();
        let data = interpolator.resolve(&HashMap::new()).await.unwrap();
        assert_eq!(data.get("postCount"), Some(&Value::from(3)));
    }

    #[tokio::test]
    async fn test_lazy_loader_runs_once() {
        static LOADS: AtomicU32 = AtomicU32::new(0);

        let lazy = LazyInterpolator::new(|| async {
            LOADS.fetch_add(1, Ordering::SeqCst);
            Arc::new(StaticInterpolator {
                name: "tags",
                key: "tagCount",
                value: 1,
            }) as Arc<dyn Interpolator>
        });
        let registry = InterpolatorRegistry::from_entries([("tags".to_string(), lazy)]);

        assert_eq!(LOADS.load(Ordering::SeqCst), 0);
        registry.lookup("tags").await.unwrap();
        registry.lookup("tags").await.unwrap();
        assert_eq!(LOADS.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unused_entry_never_loads() {
        let lazy = LazyInterpolator::new(|| async {
            Arc::new(StaticInterpolator {
                name: "unused",
                key: "unused",
                value: 0,
            }) as Arc<dyn Interpolator>
        });
        let registry = InterpolatorRegistry::from_entries([("unused".to_string(), lazy)]);

        assert!(registry.contains("unused").await);
        let entries = registry.entries.read().await;
        assert!(!entries.get("unused").unwrap().is_loaded());
    }
}
