//! Built-in block types: definitions, schemas and components.
//!
//! Each definition declares its capabilities and wires deferred loaders for
//! schema and component. The set is open: hosts register further types via
//! the catalog without touching anything here.

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde_json::Value;
use std::sync::Arc;

use interpolator::{ContentSource, InterpolatorRegistry};

use crate::capability::{Capabilities, MediaCapability};
use crate::component::{text_field, BlockComponent};
use crate::config::PipelineConfig;
use crate::definition::{BlockDefinition, Loader};
use crate::envelope::{flatten_runtime, RuntimeEnvelope};
use crate::fetcher::{FriendLinksFetcher, PaginationFetcher, PostsListFetcher};
use crate::schema::{FieldKind, FormConfig, FormField};

fn content_text<'a>(content: &'a Value, key: &str) -> &'a str {
    content.get(key).and_then(Value::as_str).unwrap_or("")
}

fn img_tag(image: &Value, class: &str) -> Option<String> {
    let url = image.get("url").and_then(Value::as_str)?;
    let width = image.get("width").and_then(Value::as_u64)?;
    let height = image.get("height").and_then(Value::as_u64)?;
    Some(format!(
        r#"<img class="{class}" src="{}" width="{width}" height="{height}">"#,
        encode_double_quoted_attribute(url)
    ))
}

/// `hero` - banner with title, subtitle and a single feature image.
struct HeroComponent;

impl BlockComponent for HeroComponent {
    fn block_type(&self) -> &str {
        "hero"
    }

    fn render(&self, content: &Value, runtime: &RuntimeEnvelope) -> String {
        let data = flatten_runtime(runtime);
        let mut html = String::from(r#"<section class="hero">"#);
        if let Some(tag) = data.get("imageData").and_then(|image| img_tag(image, "hero-image")) {
            html.push_str(&tag);
        }
        html.push_str(&format!(
            "<h1>{}</h1>",
            encode_text(content_text(content, "title"))
        ));
        let subtitle = content_text(content, "subtitle");
        if !subtitle.is_empty() {
            html.push_str(&format!("<p>{}</p>", encode_text(subtitle)));
        }
        html.push_str("</section>");
        html
    }
}

/// `gallery` - grid of images.
struct GalleryComponent;

impl BlockComponent for GalleryComponent {
    fn block_type(&self) -> &str {
        "gallery"
    }

    fn render(&self, _content: &Value, runtime: &RuntimeEnvelope) -> String {
        let data = flatten_runtime(runtime);
        let mut html = String::from(r#"<div class="gallery">"#);
        if let Some(images) = data.get("imagesData").and_then(Value::as_array) {
            for image in images {
                if let Some(tag) = img_tag(image, "gallery-image") {
                    html.push_str(&format!("<figure>{tag}</figure>"));
                }
            }
        }
        html.push_str("</div>");
        html
    }
}

/// `postsList` - heading plus the fetcher's recent posts.
struct PostsListComponent;

impl BlockComponent for PostsListComponent {
    fn block_type(&self) -> &str {
        "postsList"
    }

    fn render(&self, content: &Value, runtime: &RuntimeEnvelope) -> String {
        let data = flatten_runtime(runtime);
        let mut html = String::from(r#"<section class="posts-list">"#);
        let heading = content_text(content, "heading");
        if !heading.is_empty() {
            html.push_str(&format!("<h2>{}</h2>", encode_text(heading)));
        }
        html.push_str("<ul>");
        if let Some(posts) = data.get("postsList").and_then(Value::as_array) {
            for post in posts {
                let slug = post.get("slug").and_then(Value::as_str).unwrap_or("");
                let title = post.get("title").and_then(Value::as_str).unwrap_or("");
                html.push_str(&format!(
                    r#"<li><a href="/posts/{}">{}</a></li>"#,
                    encode_double_quoted_attribute(slug),
                    encode_text(title)
                ));
            }
        }
        html.push_str("</ul></section>");
        html
    }
}

/// `tabs` - titled panels of rich text.
struct TabsComponent;

impl BlockComponent for TabsComponent {
    fn block_type(&self) -> &str {
        "tabs"
    }

    fn render(&self, content: &Value, _runtime: &RuntimeEnvelope) -> String {
        let mut html = String::from(r#"<div class="tabs">"#);
        if let Some(tabs) = content.get("tabs").and_then(Value::as_array) {
            for tab in tabs {
                html.push_str(&format!(
                    r#"<section class="tab"><h3>{}</h3><div>{}</div></section>"#,
                    encode_text(content_text(tab, "title")),
                    encode_text(content_text(tab, "body"))
                ));
            }
        }
        html.push_str("</div>");
        html
    }
}

/// `friendLinks` - list of external links from the fetcher.
struct FriendLinksComponent;

impl BlockComponent for FriendLinksComponent {
    fn block_type(&self) -> &str {
        "friendLinks"
    }

    fn render(&self, _content: &Value, runtime: &RuntimeEnvelope) -> String {
        let data = flatten_runtime(runtime);
        let mut html = String::from(r#"<ul class="friend-links">"#);
        if let Some(links) = data.get("links").and_then(Value::as_array) {
            for link in links {
                let url = link.get("url").and_then(Value::as_str).unwrap_or("");
                let name = link.get("name").and_then(Value::as_str).unwrap_or("");
                html.push_str(&format!(
                    r#"<li><a href="{}">{}</a></li>"#,
                    encode_double_quoted_attribute(url),
                    encode_text(name)
                ));
            }
        }
        html.push_str("</ul>");
        html
    }
}

/// `pagination` - prev/next navigation from the fetcher's page window.
struct PaginationComponent;

impl BlockComponent for PaginationComponent {
    fn block_type(&self) -> &str {
        "pagination"
    }

    fn render(&self, _content: &Value, runtime: &RuntimeEnvelope) -> String {
        let data = flatten_runtime(runtime);
        let base_path = text_field(&data, "basePath");
        let page = data.get("page").and_then(Value::as_u64).unwrap_or(1);
        let total = data.get("totalPage").and_then(Value::as_u64).unwrap_or(1);

        let mut html = String::from(r#"<nav class="pagination">"#);
        if page > 1 {
            html.push_str(&format!(
                r#"<a rel="prev" href="{}?page={}">&laquo;</a>"#,
                encode_double_quoted_attribute(base_path),
                page - 1
            ));
        }
        html.push_str(&format!("<span>{page} / {total}</span>"));
        if page < total {
            html.push_str(&format!(
                r#"<a rel="next" href="{}?page={}">&raquo;</a>"#,
                encode_double_quoted_attribute(base_path),
                page + 1
            ));
        }
        html.push_str("</nav>");
        html
    }
}

/// The built-in block definitions, wired against the given collaborators.
pub fn builtin_definitions(
    source: Arc<dyn ContentSource>,
    registry: Arc<InterpolatorRegistry>,
    config: &PipelineConfig,
) -> Vec<BlockDefinition> {
    vec![
        BlockDefinition::new(
            "hero",
            Loader::new(|| async {
                Arc::new(
                    FormConfig::new("hero", "Hero banner")
                        .with_field(FormField::text("title", "Title").required())
                        .with_field(FormField::rich_text("subtitle", "Subtitle"))
                        .with_field(FormField::new("image", "Image", FieldKind::Image)),
                )
            }),
            Loader::new(|| async { Arc::new(HeroComponent) as Arc<dyn BlockComponent> }),
        )
        .with_capabilities(
            Capabilities::new()
                .with_placeholders(false)
                .with_media(MediaCapability::image_at("image", "imageData")),
        ),
        BlockDefinition::new(
            "gallery",
            Loader::new(|| async {
                Arc::new(
                    FormConfig::new("gallery", "Image gallery")
                        .with_field(FormField::new("images", "Images", FieldKind::ImageList)),
                )
            }),
            Loader::new(|| async { Arc::new(GalleryComponent) as Arc<dyn BlockComponent> }),
        )
        .with_capabilities(
            Capabilities::new().with_media(MediaCapability::image_array_at("images", "imagesData")),
        ),
        BlockDefinition::new(
            "postsList",
            Loader::new(|| async {
                Arc::new(
                    FormConfig::new("postsList", "Recent posts")
                        .with_field(FormField::rich_text("heading", "Heading"))
                        .with_field(FormField::new("limit", "Post count", FieldKind::Number)),
                )
            }),
            Loader::new(|| async { Arc::new(PostsListComponent) as Arc<dyn BlockComponent> }),
        )
        .with_capabilities(
            Capabilities::new()
                .inherit_context()
                .with_placeholders(true),
        )
        .with_fetcher(Arc::new(PostsListFetcher::new(
            source.clone(),
            registry.clone(),
            config.resolver.posts_list_limit,
        )))
        .with_cache_tags(["posts"]),
        BlockDefinition::new(
            "tabs",
            Loader::new(|| async {
                Arc::new(
                    FormConfig::new("tabs", "Tabbed panels")
                        .with_field(FormField::rich_text("tabs", "Panels")),
                )
            }),
            Loader::new(|| async { Arc::new(TabsComponent) as Arc<dyn BlockComponent> }),
        )
        .with_capabilities(Capabilities::new().with_placeholders(false)),
        BlockDefinition::new(
            "friendLinks",
            Loader::new(|| async {
                Arc::new(
                    FormConfig::new("friendLinks", "Friend links")
                        .with_field(FormField::text("group", "Link group")),
                )
            }),
            Loader::new(|| async { Arc::new(FriendLinksComponent) as Arc<dyn BlockComponent> }),
        )
        .with_fetcher(Arc::new(FriendLinksFetcher::new(source.clone())))
        .with_cache_tags(["links"]),
        BlockDefinition::new(
            "pagination",
            Loader::new(|| async {
                Arc::new(FormConfig::new("pagination", "Pagination").with_field(FormField::new(
                    "filterBy",
                    "Filter",
                    FieldKind::Select {
                        options: vec![
                            "all".to_string(),
                            "tag".to_string(),
                            "category".to_string(),
                        ],
                    },
                )))
            }),
            Loader::new(|| async { Arc::new(PaginationComponent) as Arc<dyn BlockComponent> }),
        )
        .with_capabilities(Capabilities::new().inherit_context())
        .with_fetcher(Arc::new(PaginationFetcher::new(
            registry.clone(),
            config.site.page_size,
            config.site.base_url.clone(),
        )))
        .with_cache_tags(["posts"]),
    ]
}
