//! Placeholder token parsing and serialization.
//!
//! A placeholder is a `{name}` or `{name|k1=v1&k2=v2}` token embedded in
//! free text. Parameters follow query-string semantics: pairs are separated
//! by `&`, keys and values by the first `=`, and the last occurrence of a
//! duplicate key wins. Values are raw strings interpreted by the consumer.

use serde::{Deserialize, Serialize};

/// A parsed placeholder descriptor.
///
/// Parameters keep their insertion order so that serialization is
/// deterministic: explicit parameters appear in authored order, and anything
/// appended later (for example ambient context) follows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    /// Placeholder name, never empty
    pub name: String,
    /// Ordered `key=value` parameters
    params: Vec<(String, String)>,
}

impl Placeholder {
    /// Create a placeholder with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Parse the body of a brace pair (the text between `{` and `}`).
    ///
    /// Returns `None` for an empty or whitespace-only name.
    pub(crate) fn from_body(body: &str) -> Option<Self> {
        let (name, params) = match body.split_once('|') {
            Some((name, params)) => (name, Some(params)),
            None => (body, None),
        };

        if name.trim().is_empty() {
            return None;
        }

        let mut placeholder = Self::new(name);
        if let Some(params) = params {
            for pair in params.split('&') {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                if key.is_empty() {
                    continue;
                }
                placeholder.set_param(key, value);
            }
        }
        Some(placeholder)
    }

    /// Look up a parameter value by key.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a parameter, replacing an existing value for the same key.
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.params.push((key, value)),
        }
    }

    /// Set a parameter only if the key is not already present.
    pub fn set_param_if_absent(&mut self, key: &str, value: impl Into<String>) {
        if self.param(key).is_none() {
            self.params.push((key.to_string(), value.into()));
        }
    }

    /// Builder-style [`set_param`](Self::set_param).
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_param(key, value);
        self
    }

    /// Whether any parameters are present.
    pub fn has_params(&self) -> bool {
        !self.params.is_empty()
    }

    /// Iterate parameters in insertion order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy the parameters into a plain map for consumers that do not care
    /// about ordering.
    pub fn params_map(&self) -> std::collections::HashMap<String, String> {
        self.params.iter().cloned().collect()
    }

    /// Serialize back to the textual `{name}` / `{name|k=v&k2=v2}` form.
    pub fn serialize(&self) -> String {
        if self.params.is_empty() {
            return format!("{{{}}}", self.name);
        }
        let params = self
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{{{}|{}}}", self.name, params)
    }
}

/// Scan text for placeholder tokens.
///
/// Malformed tokens (no closing brace, empty name) are skipped, not errors:
/// rendering of user-authored text is best-effort and must never fail on
/// bad syntax. A `{` opened inside a candidate token restarts the scan at
/// the inner brace, so `"a { b {posts} c"` still finds `{posts}`.
pub fn parse(text: &str) -> Vec<Placeholder> {
    let mut found = Vec::new();
    let mut offset = 0;

    while let Some(open) = text[offset..].find('{') {
        let open = offset + open;
        let rest = &text[open + 1..];

        let close = match rest.find('}') {
            Some(close) => close,
            // No closing brace anywhere after this point.
            None => break,
        };

        if let Some(inner) = rest[..close].find('{') {
            offset = open + 1 + inner;
            continue;
        }

        if let Some(placeholder) = Placeholder::from_body(&rest[..close]) {
            found.push(placeholder);
        }
        offset = open + 1 + close + 1;
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_name() {
        let found = parse("hello {posts} world");
        assert_eq!(found, vec![Placeholder::new("posts")]);
    }

    #[test]
    fn test_parse_with_params() {
        let found = parse("{tagPosts|slug=rust&page=2}");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "tagPosts");
        assert_eq!(found[0].param("slug"), Some("rust"));
        assert_eq!(found[0].param("page"), Some("2"));
    }

    #[test]
    fn test_parse_multiple() {
        let found = parse("{posts} and {categories} and {lastPublish}");
        let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["posts", "categories", "lastPublish"]);
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let found = parse("{x|page=1&page=3}");
        assert_eq!(found[0].param("page"), Some("3"));
        // The winning value keeps the key's original position.
        assert_eq!(found[0].serialize(), "{x|page=3}");
    }

    #[test]
    fn test_valueless_param() {
        let found = parse("{x|draft&slug=a}");
        assert_eq!(found[0].param("draft"), Some(""));
        assert_eq!(found[0].param("slug"), Some("a"));
    }

    #[test]
    fn test_malformed_skipped() {
        assert!(parse("no placeholders here").is_empty());
        assert!(parse("unclosed {posts").is_empty());
        assert!(parse("empty {} braces").is_empty());
        assert!(parse("{|slug=a}").is_empty());
        assert!(parse("{  }").is_empty());
    }

    #[test]
    fn test_nested_open_brace_restarts_scan() {
        let found = parse("a { b {posts} c");
        assert_eq!(found, vec![Placeholder::new("posts")]);
    }

    #[test]
    fn test_round_trip_without_params() {
        let original = Placeholder::new("posts");
        let reparsed = parse(&original.serialize());
        assert_eq!(reparsed, vec![original]);
    }

    #[test]
    fn test_round_trip_with_params() {
        let original = Placeholder::new("tagPosts")
            .with_param("slug", "rust")
            .with_param("page", "2");
        let reparsed = parse(&original.serialize());
        assert_eq!(reparsed, vec![original]);
    }
}
