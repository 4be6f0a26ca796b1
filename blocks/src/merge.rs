//! Deep merge for envelope sections.
//!
//! Objects merge key-by-key; arrays and primitives are replaced wholesale.
//! The envelope's fixed precedence (context < placeholders < media <
//! business) is expressed by merge order: later sections win on collision.

use serde_json::{Map, Value};

/// Merge `overlay` into `base`.
///
/// Matching object keys recurse; everything else (arrays, strings, numbers,
/// bools, nulls, and type mismatches) replaces the base value wholesale.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Object(overlay_map) => {
            if let Value::Object(base_map) = base {
                for (key, value) in overlay_map {
                    match base_map.get_mut(&key) {
                        Some(existing) => deep_merge(existing, value),
                        None => {
                            base_map.insert(key, value);
                        }
                    }
                }
            } else {
                *base = Value::Object(overlay_map);
            }
        }
        other => *base = other,
    }
}

/// Flatten sections into one map, later sections winning on collision.
pub fn flatten_sections<'a>(
    sections: impl IntoIterator<Item = &'a Map<String, Value>>,
) -> Map<String, Value> {
    let mut merged = Value::Object(Map::new());
    for section in sections {
        deep_merge(&mut merged, Value::Object(section.clone()));
    }
    match merged {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_later_section_wins() {
        let context = as_map(json!({ "a": 1 }));
        let placeholders = as_map(json!({ "a": 2, "b": 2 }));
        let media = as_map(json!({ "b": 3, "c": 3 }));
        let business = as_map(json!({ "c": 4 }));

        let merged = flatten_sections([&context, &placeholders, &media, &business]);
        assert_eq!(Value::Object(merged), json!({ "a": 2, "b": 3, "c": 4 }));
    }

    #[test]
    fn test_nested_objects_merge() {
        let mut base = json!({ "hero": { "title": "t", "image": "old.jpg" } });
        deep_merge(&mut base, json!({ "hero": { "image": "new.jpg" } }));
        assert_eq!(base, json!({ "hero": { "title": "t", "image": "new.jpg" } }));
    }

    #[test]
    fn test_arrays_replaced_wholesale() {
        let mut base = json!({ "items": [1, 2, 3] });
        deep_merge(&mut base, json!({ "items": [9] }));
        assert_eq!(base, json!({ "items": [9] }));
    }

    #[test]
    fn test_type_mismatch_replaced() {
        let mut base = json!({ "value": { "nested": true } });
        deep_merge(&mut base, json!({ "value": 7 }));
        assert_eq!(base, json!({ "value": 7 }));
    }
}
