//! Built-in interpolators.
//!
//! Two families:
//! - Site-scope interpolators (`{posts}`, `{categories}`, `{tags}`,
//!   `{lastPublish}`) compute cheap aggregate facts and take no parameters.
//! - Entity-scope interpolators (`{tagPosts|slug=..&page=..}`,
//!   `{categoryPosts|path=..&page=..}`) resolve one entity plus pagination
//!   math. A missing entity yields a documented zero/empty default map so
//!   placeholder-bearing text degrades instead of failing.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::pagination::{parse_page_param, PageWindow};
use crate::registry::{Interpolator, InterpolatorRegistry, LazyInterpolator};
use crate::source::{ContentSource, SourceError};

/// Default page size when neither the placeholder nor the host configures one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

fn page_size_param(params: &HashMap<String, String>, fallback: u64) -> u64 {
    params
        .get("size")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(fallback)
        .max(1)
}

/// `{posts}` - total published post count.
pub struct PostsInterpolator {
    source: Arc<dyn ContentSource>,
}

impl PostsInterpolator {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Interpolator for PostsInterpolator {
    fn name(&self) -> &str {
        "posts"
    }

    async fn resolve(
        &self,
        _params: &HashMap<String, String>,
    ) -> Result<Map<String, Value>, SourceError> {
        let count = self.source.count_posts().await?;
        let mut map = Map::new();
        map.insert("postCount".to_string(), Value::from(count));
        Ok(map)
    }
}

/// `{categories}` - total category count.
pub struct CategoriesInterpolator {
    source: Arc<dyn ContentSource>,
}

impl CategoriesInterpolator {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Interpolator for CategoriesInterpolator {
    fn name(&self) -> &str {
        "categories"
    }

    async fn resolve(
        &self,
        _params: &HashMap<String, String>,
    ) -> Result<Map<String, Value>, SourceError> {
        let count = self.source.count_categories().await?;
        let mut map = Map::new();
        map.insert("categoryCount".to_string(), Value::from(count));
        Ok(map)
    }
}

/// `{tags}` - total tag count.
pub struct TagsInterpolator {
    source: Arc<dyn ContentSource>,
}

impl TagsInterpolator {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Interpolator for TagsInterpolator {
    fn name(&self) -> &str {
        "tags"
    }

    async fn resolve(
        &self,
        _params: &HashMap<String, String>,
    ) -> Result<Map<String, Value>, SourceError> {
        let count = self.source.count_tags().await?;
        let mut map = Map::new();
        map.insert("tagCount".to_string(), Value::from(count));
        Ok(map)
    }
}

/// `{lastPublish}` - RFC 3339 timestamp of the latest post, empty string on
/// an empty site.
pub struct LastPublishInterpolator {
    source: Arc<dyn ContentSource>,
}

impl LastPublishInterpolator {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Interpolator for LastPublishInterpolator {
    fn name(&self) -> &str {
        "lastPublish"
    }

    async fn resolve(
        &self,
        _params: &HashMap<String, String>,
    ) -> Result<Map<String, Value>, SourceError> {
        let last = self.source.last_publish_time().await?;
        let mut map = Map::new();
        map.insert(
            "lastPublishTime".to_string(),
            Value::String(last.map(|t| t.to_rfc3339()).unwrap_or_default()),
        );
        Ok(map)
    }
}

/// `{tagPosts|slug=..&page=..}` - one tag plus its pagination window.
pub struct TagPostsInterpolator {
    source: Arc<dyn ContentSource>,
    page_size: u64,
}

impl TagPostsInterpolator {
    pub fn new(source: Arc<dyn ContentSource>, page_size: u64) -> Self {
        Self { source, page_size }
    }

    /// The documented missing-entity default: empty strings, zero count,
    /// page as requested, a single page.
    fn default_map(page: u64) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("tag".to_string(), Value::String(String::new()));
        map.insert("tagName".to_string(), Value::String(String::new()));
        map.insert("tagPostCount".to_string(), Value::from(0u64));
        map.insert("tagPage".to_string(), Value::from(page));
        map.insert("tagTotalPage".to_string(), Value::from(1u64));
        map.insert("tagFirstItem".to_string(), Value::from(1u64));
        map.insert("tagLastItem".to_string(), Value::from(0u64));
        map
    }
}

#[async_trait]
impl Interpolator for TagPostsInterpolator {
    fn name(&self) -> &str {
        "tagPosts"
    }

    async fn resolve(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<Map<String, Value>, SourceError> {
        let page = parse_page_param(params.get("page").map(String::as_str));
        let size = page_size_param(params, self.page_size);

        let slug = match params.get("slug") {
            Some(slug) if !slug.is_empty() => slug,
            _ => return Ok(Self::default_map(page)),
        };

        let tag = match self.source.tag_by_slug(slug).await? {
            Some(tag) => tag,
            None => return Ok(Self::default_map(page)),
        };

        let count = self.source.count_posts_with_tag(slug).await?;
        let window = PageWindow::compute(count, size, page);

        let mut map = Map::new();
        map.insert("tag".to_string(), Value::String(tag.slug));
        map.insert("tagName".to_string(), Value::String(tag.name));
        map.insert("tagPostCount".to_string(), Value::from(count));
        map.insert("tagPage".to_string(), Value::from(page));
        map.insert("tagTotalPage".to_string(), Value::from(window.total_pages));
        map.insert(
            "tagFirstItem".to_string(),
            Value::from(window.first_item_index),
        );
        map.insert(
            "tagLastItem".to_string(),
            Value::from(window.last_item_index),
        );
        Ok(map)
    }
}

/// `{categoryPosts|path=..&page=..}` - one category (nested path) plus its
/// pagination window. Accepts `slug` as an alias for `path`.
pub struct CategoryPostsInterpolator {
    source: Arc<dyn ContentSource>,
    page_size: u64,
}

impl CategoryPostsInterpolator {
    pub fn new(source: Arc<dyn ContentSource>, page_size: u64) -> Self {
        Self { source, page_size }
    }

    fn default_map(page: u64) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("category".to_string(), Value::String(String::new()));
        map.insert("categoryName".to_string(), Value::String(String::new()));
        map.insert("categoryPostCount".to_string(), Value::from(0u64));
        map.insert("categoryPage".to_string(), Value::from(page));
        map.insert("categoryTotalPage".to_string(), Value::from(1u64));
        map.insert("categoryFirstItem".to_string(), Value::from(1u64));
        map.insert("categoryLastItem".to_string(), Value::from(0u64));
        map
    }
}

#[async_trait]
impl Interpolator for CategoryPostsInterpolator {
    fn name(&self) -> &str {
        "categoryPosts"
    }

    async fn resolve(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<Map<String, Value>, SourceError> {
        let page = parse_page_param(params.get("page").map(String::as_str));
        let size = page_size_param(params, self.page_size);

        let path = match params.get("path").or_else(|| params.get("slug")) {
            Some(path) if !path.is_empty() => path,
            _ => return Ok(Self::default_map(page)),
        };

        let category = match self.source.category_by_path(path).await? {
            Some(category) => category,
            None => return Ok(Self::default_map(page)),
        };

        let count = self.source.count_posts_in_category(path).await?;
        let window = PageWindow::compute(count, size, page);

        let mut map = Map::new();
        map.insert("category".to_string(), Value::String(category.path));
        map.insert("categoryName".to_string(), Value::String(category.name));
        map.insert("categoryPostCount".to_string(), Value::from(count));
        map.insert("categoryPage".to_string(), Value::from(page));
        map.insert(
            "categoryTotalPage".to_string(),
            Value::from(window.total_pages),
        );
        map.insert(
            "categoryFirstItem".to_string(),
            Value::from(window.first_item_index),
        );
        map.insert(
            "categoryLastItem".to_string(),
            Value::from(window.last_item_index),
        );
        Ok(map)
    }
}

/// Build a registry holding all built-in interpolators.
///
/// Every entry is behind a lazy loader, so a page that never mentions
/// `{tagPosts}` never constructs its interpolator.
pub fn builtin_registry(source: Arc<dyn ContentSource>, page_size: u64) -> InterpolatorRegistry {
    let entries = [
        ("posts", {
            let source = source.clone();
            LazyInterpolator::new(move || {
                let source = source.clone();
                async move { Arc::new(PostsInterpolator::new(source)) as Arc<dyn Interpolator> }
            })
        }),
        ("categories", {
            let source = source.clone();
            LazyInterpolator::new(move || {
                let source = source.clone();
                async move { Arc::new(CategoriesInterpolator::new(source)) as Arc<dyn Interpolator> }
            })
        }),
        ("tags", {
            let source = source.clone();
            LazyInterpolator::new(move || {
                let source = source.clone();
                async move { Arc::new(TagsInterpolator::new(source)) as Arc<dyn Interpolator> }
            })
        }),
        ("lastPublish", {
            let source = source.clone();
            LazyInterpolator::new(move || {
                let source = source.clone();
                async move { Arc::new(LastPublishInterpolator::new(source)) as Arc<dyn Interpolator> }
            })
        }),
        ("tagPosts", {
            let source = source.clone();
            LazyInterpolator::new(move || {
                let source = source.clone();
                async move {
                    Arc::new(TagPostsInterpolator::new(source, page_size)) as Arc<dyn Interpolator>
                }
            })
        }),
        ("categoryPosts", {
            let source = source.clone();
            LazyInterpolator::new(move || {
                let source = source.clone();
                async move {
                    Arc::new(CategoryPostsInterpolator::new(source, page_size))
                        as Arc<dyn Interpolator>
                }
            })
        }),
    ];

    InterpolatorRegistry::from_entries(entries.map(|(name, lazy)| (name.to_string(), lazy)))
}
