//! String-leaf traversal of JSON content trees.
//!
//! Block content is an open-ended JSON tree; placeholders can appear in any
//! string leaf anywhere inside it. The traversal here is generic over the
//! tree shape so no block type needs its own scanning code.

use serde_json::Value;

use crate::token::{parse, Placeholder};

/// Visit every string leaf of a JSON value.
///
/// Objects are visited in map order, arrays in index order; numbers, bools
/// and nulls are ignored.
pub fn visit_strings<'a>(value: &'a Value, visit: &mut dyn FnMut(&'a str)) {
    match value {
        Value::String(s) => visit(s),
        Value::Array(items) => {
            for item in items {
                visit_strings(item, visit);
            }
        }
        Value::Object(map) => {
            for (_, item) in map {
                visit_strings(item, visit);
            }
        }
        _ => {}
    }
}

/// Collect every well-formed placeholder from the string leaves of a content
/// tree, in traversal order. Duplicates are kept; deduplication is the
/// batch resolver's concern.
pub fn collect_placeholders(content: &Value) -> Vec<Placeholder> {
    let mut found = Vec::new();
    visit_strings(content, &mut |text| found.extend(parse(text)));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collects_from_nested_tree() {
        let content = json!({
            "title": "All {posts} so far",
            "sections": [
                { "body": "{tagPosts|slug=rust}" },
                { "body": "no tokens", "count": 7 },
            ],
            "footer": "{lastPublish}",
        });

        // serde_json objects iterate in key order: footer, sections, title.
        let names: Vec<_> = collect_placeholders(&content)
            .iter()
            .map(|p| p.name.clone())
            .collect();
        assert_eq!(names, vec!["lastPublish", "tagPosts", "posts"]);
    }

    #[test]
    fn test_non_string_leaves_ignored() {
        let content = json!({ "a": 1, "b": true, "c": null, "d": [2, 3] });
        assert!(collect_placeholders(&content).is_empty());
    }

    #[test]
    fn test_duplicates_kept() {
        let content = json!(["{posts}", "{posts}"]);
        assert_eq!(collect_placeholders(&content).len(), 2);
    }
}
