//! Mock content source for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::source::*;

/// Mock content source for testing.
///
/// Seeded with builder methods; counts queries so tests can assert how many
/// round-trips a resolution pass made.
pub struct MockContentSource {
    posts: Vec<PostSummary>,
    tags: Vec<TagEntity>,
    categories: Vec<CategoryEntity>,
    links: Vec<FriendLink>,
    tag_post_counts: HashMap<String, u64>,
    category_post_counts: HashMap<String, u64>,
    available: AtomicBool,
    query_count: AtomicU32,
}

impl MockContentSource {
    /// Create an empty mock source.
    pub fn new() -> Self {
        Self {
            posts: Vec::new(),
            tags: Vec::new(),
            categories: Vec::new(),
            links: Vec::new(),
            tag_post_counts: HashMap::new(),
            category_post_counts: HashMap::new(),
            available: AtomicBool::new(true),
            query_count: AtomicU32::new(0),
        }
    }

    /// Add a post. Posts are returned by `recent_posts` newest first.
    pub fn with_post(mut self, post: PostSummary) -> Self {
        self.posts.push(post);
        self
    }

    /// Add a tag with its post count.
    pub fn with_tag(mut self, slug: impl Into<String>, name: impl Into<String>, posts: u64) -> Self {
        let slug = slug.into();
        self.tag_post_counts.insert(slug.clone(), posts);
        self.tags.push(TagEntity {
            slug,
            name: name.into(),
        });
        self
    }

    /// Add a category with its post count.
    pub fn with_category(
        mut self,
        path: impl Into<String>,
        name: impl Into<String>,
        posts: u64,
    ) -> Self {
        let path = path.into();
        self.category_post_counts.insert(path.clone(), posts);
        self.categories.push(CategoryEntity {
            path,
            name: name.into(),
        });
        self
    }

    /// Add a friend link.
    pub fn with_link(mut self, link: FriendLink) -> Self {
        self.links.push(link);
        self
    }

    /// Set availability. Unavailable sources fail every query.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Number of queries served so far.
    pub fn query_count(&self) -> u32 {
        self.query_count.load(Ordering::SeqCst)
    }

    fn record(&self) -> Result<(), SourceError> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SourceError::Unavailable("mock source disabled".to_string()))
        }
    }
}

impl Default for MockContentSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentSource for MockContentSource {
    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn count_posts(&self) -> Result<u64, SourceError> {
        self.record()?;
        Ok(self.posts.len() as u64)
    }

    async fn count_categories(&self) -> Result<u64, SourceError> {
        self.record()?;
        Ok(self.categories.len() as u64)
    }

    async fn count_tags(&self) -> Result<u64, SourceError> {
        self.record()?;
        Ok(self.tags.len() as u64)
    }

    async fn last_publish_time(&self) -> Result<Option<DateTime<Utc>>, SourceError> {
        self.record()?;
        Ok(self.posts.iter().map(|p| p.published_at).max())
    }

    async fn tag_by_slug(&self, slug: &str) -> Result<Option<TagEntity>, SourceError> {
        self.record()?;
        Ok(self.tags.iter().find(|t| t.slug == slug).cloned())
    }

    async fn category_by_path(&self, path: &str) -> Result<Option<CategoryEntity>, SourceError> {
        self.record()?;
        Ok(self.categories.iter().find(|c| c.path == path).cloned())
    }

    async fn count_posts_with_tag(&self, slug: &str) -> Result<u64, SourceError> {
        self.record()?;
        Ok(self.tag_post_counts.get(slug).copied().unwrap_or(0))
    }

    async fn count_posts_in_category(&self, path: &str) -> Result<u64, SourceError> {
        self.record()?;
        Ok(self.category_post_counts.get(path).copied().unwrap_or(0))
    }

    async fn recent_posts(&self, limit: usize) -> Result<Vec<PostSummary>, SourceError> {
        self.record()?;
        let mut posts = self.posts.clone();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        posts.truncate(limit);
        Ok(posts)
    }

    async fn friend_links(&self, group: Option<&str>) -> Result<Vec<FriendLink>, SourceError> {
        self.record()?;
        Ok(self
            .links
            .iter()
            .filter(|l| group.is_none() || l.group.as_deref() == group)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_and_lookups() {
        let source = MockContentSource::new()
            .with_post(PostSummary::new("hello", "Hello"))
            .with_tag("rust", "Rust", 4);

        assert_eq!(source.count_posts().await.unwrap(), 1);
        assert_eq!(source.count_tags().await.unwrap(), 1);
        assert_eq!(source.count_posts_with_tag("rust").await.unwrap(), 4);
        assert!(source.tag_by_slug("rust").await.unwrap().is_some());
        assert!(source.tag_by_slug("go").await.unwrap().is_none());
        assert_eq!(source.query_count(), 5);
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let source = MockContentSource::new().with_available(false);

        assert!(!source.is_available().await);
        assert!(source.count_posts().await.is_err());
    }

    #[tokio::test]
    async fn test_friend_links_group_filter() {
        let source = MockContentSource::new()
            .with_link(FriendLink {
                name: "a".to_string(),
                url: "https://a.example".to_string(),
                group: Some("tech".to_string()),
                logo: None,
            })
            .with_link(FriendLink {
                name: "b".to_string(),
                url: "https://b.example".to_string(),
                group: None,
                logo: None,
            });

        assert_eq!(source.friend_links(None).await.unwrap().len(), 2);
        assert_eq!(source.friend_links(Some("tech")).await.unwrap().len(), 1);
    }
}
