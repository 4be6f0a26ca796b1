//! The content-source collaborator trait.
//!
//! This module defines the `ContentSource` trait - the abstraction over the
//! host application's database that interpolators and fetchers query. The
//! pipeline never talks to storage directly; the host supplies an
//! implementation and tests use [`crate::mock::MockContentSource`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error types for content-source queries.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Source is not reachable
    #[error("Content source unavailable: {0}")]
    Unavailable(String),

    /// A query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A parameter could not be interpreted
    #[error("Invalid parameter {name}: {value}")]
    InvalidParam { name: String, value: String },
}

/// Summary of a published post, as list queries return it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// URL slug
    pub slug: String,
    /// Display title
    pub title: String,
    /// Publication time
    pub published_at: DateTime<Utc>,
    /// Feature image URL, if set
    pub feature_image: Option<String>,
}

impl PostSummary {
    /// Create a summary published now.
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            published_at: Utc::now(),
            feature_image: None,
        }
    }

    /// Set the feature image URL.
    pub fn with_feature_image(mut self, url: impl Into<String>) -> Self {
        self.feature_image = Some(url.into());
        self
    }

    /// Set the publication time.
    pub fn with_published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = at;
        self
    }
}

/// A tag entity resolved by slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagEntity {
    /// URL slug
    pub slug: String,
    /// Display name
    pub name: String,
}

/// A category entity resolved by its (possibly nested) path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntity {
    /// Slash-separated category path, e.g. `tech/rust`
    pub path: String,
    /// Display name of the leaf category
    pub name: String,
}

/// An external link shown by the friend-links block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendLink {
    /// Display name
    pub name: String,
    /// Target URL
    pub url: String,
    /// Optional grouping key for filtered display
    pub group: Option<String>,
    /// Optional logo image URL
    pub logo: Option<String>,
}

/// Core trait for content sources.
///
/// Abstracts the host application's database behind the handful of queries
/// the block pipeline needs. Entity lookups return `Ok(None)` for missing
/// entities; errors are reserved for the source itself failing.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Check if the source is currently reachable.
    async fn is_available(&self) -> bool;

    /// Total number of published posts.
    async fn count_posts(&self) -> Result<u64, SourceError>;

    /// Total number of categories.
    async fn count_categories(&self) -> Result<u64, SourceError>;

    /// Total number of tags.
    async fn count_tags(&self) -> Result<u64, SourceError>;

    /// Publication time of the most recent post, if any post exists.
    async fn last_publish_time(&self) -> Result<Option<DateTime<Utc>>, SourceError>;

    /// Resolve a tag by slug.
    async fn tag_by_slug(&self, slug: &str) -> Result<Option<TagEntity>, SourceError>;

    /// Resolve a category by its nested path.
    async fn category_by_path(&self, path: &str) -> Result<Option<CategoryEntity>, SourceError>;

    /// Number of posts carrying the given tag.
    async fn count_posts_with_tag(&self, slug: &str) -> Result<u64, SourceError>;

    /// Number of posts in the given category.
    async fn count_posts_in_category(&self, path: &str) -> Result<u64, SourceError>;

    /// The most recently published posts, newest first.
    async fn recent_posts(&self, limit: usize) -> Result<Vec<PostSummary>, SourceError>;

    /// Friend links, optionally filtered to one group.
    async fn friend_links(&self, group: Option<&str>) -> Result<Vec<FriendLink>, SourceError>;
}
