//! Business-data fetchers.
//!
//! A fetcher is a block-type-specific async function producing data beyond
//! generic placeholder/media resolution. The composition pattern is always
//! the same: interpolated data spreads first, direct query results spread
//! last, so queries win on key collision - consistent with the envelope's
//! merge order, where business data has the final say.
//!
//! Fetchers may call the interpolator registry; the registry never calls
//! back into fetchers.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use interpolator::{
    fetch_interpolated_data, ContentSource, InterpolatorRegistry, PageWindow, SourceError,
};
use placeholder::ContextData;

/// A block type's business-data producer.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Produce the business section for one block instance.
    async fn fetch(
        &self,
        content: &Value,
        context: &ContextData,
    ) -> Result<Map<String, Value>, SourceError>;
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, SourceError> {
    serde_json::to_value(value).map_err(|e| SourceError::QueryFailed(e.to_string()))
}

/// Fetcher for the `postsList` block: top-N recent posts alongside the
/// block's interpolated text data.
pub struct PostsListFetcher {
    source: Arc<dyn ContentSource>,
    registry: Arc<InterpolatorRegistry>,
    default_limit: usize,
}

impl PostsListFetcher {
    pub fn new(
        source: Arc<dyn ContentSource>,
        registry: Arc<InterpolatorRegistry>,
        default_limit: usize,
    ) -> Self {
        Self {
            source,
            registry,
            default_limit,
        }
    }
}

#[async_trait]
impl Fetcher for PostsListFetcher {
    async fn fetch(
        &self,
        content: &Value,
        context: &ContextData,
    ) -> Result<Map<String, Value>, SourceError> {
        let limit = content
            .get("limit")
            .and_then(Value::as_u64)
            .unwrap_or(self.default_limit as u64) as usize;

        // Interpolation and the post query run concurrently.
        let (interpolated, posts) = tokio::join!(
            fetch_interpolated_data(&self.registry, content, Some(context)),
            self.source.recent_posts(limit),
        );
        let posts = posts?;

        let mut data = interpolated;
        data.insert("postsListCount".to_string(), Value::from(posts.len()));
        data.insert("postsList".to_string(), to_json(&posts)?);
        Ok(data)
    }
}

/// Fetcher for the `friendLinks` block: links filtered by the block's
/// configured group.
pub struct FriendLinksFetcher {
    source: Arc<dyn ContentSource>,
}

impl FriendLinksFetcher {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Fetcher for FriendLinksFetcher {
    async fn fetch(
        &self,
        content: &Value,
        _context: &ContextData,
    ) -> Result<Map<String, Value>, SourceError> {
        let group = content.get("group").and_then(Value::as_str);
        let links = self.source.friend_links(group).await?;

        let mut data = Map::new();
        data.insert("linkCount".to_string(), Value::from(links.len()));
        data.insert("links".to_string(), to_json(&links)?);
        Ok(data)
    }
}

/// Fetcher for the `pagination` block.
///
/// Computes the listing's base path from the block's `filterBy`
/// discriminator and delegates total-page math to the matching
/// interpolator, so pagination agrees with whatever the listing itself
/// shows.
pub struct PaginationFetcher {
    registry: Arc<InterpolatorRegistry>,
    page_size: u64,
    base_url: String,
}

impl PaginationFetcher {
    pub fn new(registry: Arc<InterpolatorRegistry>, page_size: u64, base_url: String) -> Self {
        Self {
            registry,
            page_size,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn delegated_total(
        &self,
        name: &str,
        key: &str,
        params: HashMap<String, String>,
    ) -> Result<u64, SourceError> {
        let interpolator = match self.registry.lookup(name).await {
            Some(interpolator) => interpolator,
            None => return Ok(1),
        };
        let data = interpolator.resolve(&params).await?;
        Ok(data.get(key).and_then(Value::as_u64).unwrap_or(1))
    }
}

#[async_trait]
impl Fetcher for PaginationFetcher {
    async fn fetch(
        &self,
        content: &Value,
        context: &ContextData,
    ) -> Result<Map<String, Value>, SourceError> {
        let filter_by = content
            .get("filterBy")
            .and_then(Value::as_str)
            .unwrap_or("all");
        let page = u64::from(context.page.unwrap_or(1)).max(1);
        let slug = context.slug.clone().unwrap_or_default();
        let page_param = ("page".to_string(), page.to_string());

        let (base_path, total_page) = match filter_by {
            "tag" => {
                let params =
                    HashMap::from([("slug".to_string(), slug.clone()), page_param.clone()]);
                let total = self.delegated_total("tagPosts", "tagTotalPage", params).await?;
                (format!("{}/tags/{slug}", self.base_url), total)
            }
            "category" => {
                let params =
                    HashMap::from([("path".to_string(), slug.clone()), page_param.clone()]);
                let total = self
                    .delegated_total("categoryPosts", "categoryTotalPage", params)
                    .await?;
                (format!("{}/categories/{slug}", self.base_url), total)
            }
            _ => {
                let count_data = match self.registry.lookup("posts").await {
                    Some(interpolator) => interpolator.resolve(&HashMap::new()).await?,
                    None => Map::new(),
                };
                let count = count_data
                    .get("postCount")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                let window = PageWindow::compute(count, self.page_size, page);
                (format!("{}/posts", self.base_url), window.total_pages)
            }
        };

        let mut data = Map::new();
        data.insert("basePath".to_string(), Value::String(base_path));
        data.insert("page".to_string(), Value::from(page));
        data.insert("totalPage".to_string(), Value::from(total_page));
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interpolator::{builtin_registry, MockContentSource, PostSummary};
    use serde_json::json;

    fn seeded() -> (Arc<MockContentSource>, Arc<InterpolatorRegistry>) {
        let source = Arc::new(
            MockContentSource::new()
                .with_post(PostSummary::new("one", "One"))
                .with_post(PostSummary::new("two", "Two"))
                .with_post(PostSummary::new("three", "Three"))
                .with_tag("rust", "Rust", 45),
        );
        let registry = Arc::new(builtin_registry(source.clone(), 20));
        (source, registry)
    }

    #[tokio::test]
    async fn test_posts_list_combines_interpolation_and_query() {
        let (source, registry) = seeded();
        let fetcher = PostsListFetcher::new(source, registry, 10);
        let content = json!({ "heading": "{posts} posts so far", "limit": 2 });

        let data = fetcher.fetch(&content, &ContextData::new()).await.unwrap();

        // Interpolated data and query results in one map.
        assert_eq!(data.get("postCount"), Some(&json!(3)));
        assert_eq!(data.get("postsListCount"), Some(&json!(2)));
        let posts = data.get("postsList").and_then(Value::as_array).unwrap();
        assert_eq!(posts.len(), 2);
    }

    #[tokio::test]
    async fn test_pagination_all_filter() {
        let (_, registry) = seeded();
        let fetcher = PaginationFetcher::new(registry, 2, "https://blog.example/".to_string());
        let context = ContextData::new().with_page(2);

        let data = fetcher
            .fetch(&json!({ "filterBy": "all" }), &context)
            .await
            .unwrap();

        assert_eq!(data.get("basePath"), Some(&json!("https://blog.example/posts")));
        assert_eq!(data.get("page"), Some(&json!(2)));
        assert_eq!(data.get("totalPage"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_pagination_tag_filter_delegates() {
        let (_, registry) = seeded();
        let fetcher = PaginationFetcher::new(registry, 20, String::new());
        let context = ContextData::new().with_slug("rust").with_page(3);

        let data = fetcher
            .fetch(&json!({ "filterBy": "tag" }), &context)
            .await
            .unwrap();

        assert_eq!(data.get("basePath"), Some(&json!("/tags/rust")));
        assert_eq!(data.get("totalPage"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_friend_links_group_filter() {
        let source = Arc::new(
            MockContentSource::new()
                .with_link(interpolator::FriendLink {
                    name: "a".to_string(),
                    url: "https://a.example".to_string(),
                    group: Some("tech".to_string()),
                    logo: None,
                })
                .with_link(interpolator::FriendLink {
                    name: "b".to_string(),
                    url: "https://b.example".to_string(),
                    group: Some("art".to_string()),
                    logo: None,
                }),
        );
        let fetcher = FriendLinksFetcher::new(source);

        let data = fetcher
            .fetch(&json!({ "group": "tech" }), &ContextData::new())
            .await
            .unwrap();

        assert_eq!(data.get("linkCount"), Some(&json!(1)));
    }
}
