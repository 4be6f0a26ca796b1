//! Ambient page context and its attachment to placeholders.
//!
//! A [`ContextData`] is built once per page request and handed read-only to
//! every block on that page. [`attach`] folds the ambient `slug` / `page` /
//! `url` fields into a placeholder's parameters so that parametrized
//! interpolators see them, without ever clobbering what the author wrote
//! explicitly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::token::Placeholder;

/// Ambient fields available while rendering one page.
///
/// Constructed once per request; read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextData {
    /// Slug of the entity the page is about, if any
    pub slug: Option<String>,
    /// Current page number for paginated views
    pub page: Option<u32>,
    /// Canonical URL of the page being rendered
    pub url: Option<String>,
    /// Arbitrary extra context values
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl ContextData {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slug.
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Set the page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the canonical URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Add an extra context value.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// The context section of a runtime envelope: ambient fields that are
    /// set, plus all extra values.
    pub fn to_section(&self) -> Map<String, Value> {
        let mut section = Map::new();
        if let Some(slug) = &self.slug {
            section.insert("slug".to_string(), Value::String(slug.clone()));
        }
        if let Some(page) = self.page {
            section.insert("page".to_string(), Value::from(page));
        }
        if let Some(url) = &self.url {
            section.insert("url".to_string(), Value::String(url.clone()));
        }
        for (key, value) in &self.extra {
            section.insert(key.clone(), value.clone());
        }
        section
    }
}

impl ContextData {
    /// Fold ambient `slug` / `page` / `url` into a placeholder's parameters.
    ///
    /// Only missing keys are added; explicit parameters always win.
    pub fn merge_into(&self, placeholder: &mut Placeholder) {
        if let Some(slug) = &self.slug {
            placeholder.set_param_if_absent("slug", slug);
        }
        if let Some(page) = self.page {
            placeholder.set_param_if_absent("page", page.to_string());
        }
        if let Some(url) = &self.url {
            placeholder.set_param_if_absent("url", url);
        }
    }
}

/// Re-serialize a placeholder with ambient context folded in.
///
/// `slug`, `page` and `url` from the context are appended only when the
/// placeholder does not already carry them; explicit parameters always win.
/// With neither explicit nor ambient parameters the bare `{name}` form comes
/// back out. Pure, no I/O.
pub fn attach(placeholder: &Placeholder, context: &ContextData) -> String {
    let mut attached = placeholder.clone();
    context.merge_into(&mut attached);
    attached.serialize()
}
