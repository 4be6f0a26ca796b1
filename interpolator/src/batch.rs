//! Batch placeholder resolution over a block content tree.
//!
//! Walks every string leaf of the content, parses placeholders, folds in
//! ambient context, deduplicates by name, and resolves every distinct name
//! concurrently. Results are merged in sorted placeholder-name order, so the
//! last-writer-wins rule on colliding keys is stable across runs. One
//! failing interpolator is logged and omitted; the batch itself never fails.

use futures::future::join_all;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::collections::HashMap;
use tracing::{debug, warn};

use placeholder::{collect_placeholders, ContextData};

use crate::registry::InterpolatorRegistry;

/// A non-fatal problem encountered while resolving one placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpolationDiagnostic {
    /// Placeholder name the problem belongs to
    pub placeholder: String,
    /// Human-readable description
    pub message: String,
}

/// Resolve every placeholder in `content` into one flat data map.
///
/// Never fails: unknown names and erroring interpolators contribute nothing.
pub async fn fetch_interpolated_data(
    registry: &InterpolatorRegistry,
    content: &Value,
    context: Option<&ContextData>,
) -> Map<String, Value> {
    let (data, _) = fetch_interpolated_data_with_diagnostics(registry, content, context).await;
    data
}

/// [`fetch_interpolated_data`] plus a list of non-fatal diagnostics, for
/// editor surfaces that want to show authors what went wrong.
pub async fn fetch_interpolated_data_with_diagnostics(
    registry: &InterpolatorRegistry,
    content: &Value,
    context: Option<&ContextData>,
) -> (Map<String, Value>, Vec<InterpolationDiagnostic>) {
    // Dedupe by name; the first occurrence of a name fixes the params used
    // for that batch. BTreeMap keeps resolution and merge order stable.
    let mut wanted: BTreeMap<String, HashMap<String, String>> = BTreeMap::new();
    for mut found in collect_placeholders(content) {
        if let Some(context) = context {
            context.merge_into(&mut found);
        }
        wanted
            .entry(found.name.clone())
            .or_insert_with(|| found.params_map());
    }

    let tasks = wanted.into_iter().map(|(name, params)| async move {
        let outcome = match registry.lookup(&name).await {
            Some(interpolator) => Some(interpolator.resolve(&params).await),
            None => None,
        };
        (name, outcome)
    });

    let mut data = Map::new();
    let mut diagnostics = Vec::new();

    for (name, outcome) in join_all(tasks).await {
        match outcome {
            Some(Ok(values)) => {
                debug!(placeholder = %name, keys = values.len(), "Interpolated placeholder");
                data.extend(values);
            }
            Some(Err(error)) => {
                warn!(placeholder = %name, %error, "Interpolator failed; omitting its keys");
                diagnostics.push(InterpolationDiagnostic {
                    placeholder: name,
                    message: error.to_string(),
                });
            }
            None => {
                if cfg!(debug_assertions) {
                    warn!(placeholder = %name, "No interpolator registered for placeholder");
                }
                diagnostics.push(InterpolationDiagnostic {
                    placeholder: name.clone(),
                    message: format!("no interpolator registered for {{{name}}}"),
                });
            }
        }
    }

    (data, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Interpolator;
    use crate::source::SourceError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct FixedInterpolator {
        name: &'static str,
        entries: Vec<(&'static str, Value)>,
    }

    #[async_trait]
    impl Interpolator for FixedInterpolator {
        fn name(&self) -> &str {
            self.name
        }

        async fn resolve(
            &self,
            _params: &HashMap<String, String>,
        ) -> Result<Map<String, Value>, SourceError> {
            Ok(self
                .entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect())
        }
    }

    struct FailingInterpolator;

    #[async_trait]
    impl Interpolator for FailingInterpolator {
        fn name(&self) -> &str {
            "broken"
        }

        async fn resolve(
            &self,
            _params: &HashMap<String, String>,
        ) -> Result<Map<String, Value>, SourceError> {
            Err(SourceError::QueryFailed("boom".to_string()))
        }
    }

    struct EchoParamsInterpolator;

    #[async_trait]
    impl Interpolator for EchoParamsInterpolator {
        fn name(&self) -> &str {
            "echo"
        }

        async fn resolve(
            &self,
            params: &HashMap<String, String>,
        ) -> Result<Map<String, Value>, SourceError> {
            Ok(params
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect())
        }
    }

    async fn registry_with(interpolators: Vec<Arc<dyn Interpolator>>) -> InterpolatorRegistry {
        let registry = InterpolatorRegistry::new();
        for interpolator in interpolators {
            registry.register_eager(interpolator).await;
        }
        registry
    }

    #[tokio::test]
    async fn test_batch_merges_all_names() {
        let registry = registry_with(vec![
            Arc::new(FixedInterpolator {
                name: "posts",
                entries: vec![("postCount", json!(7))],
            }),
            Arc::new(FixedInterpolator {
                name: "tags",
                entries: vec![("tagCount", json!(2))],
            }),
        ])
        .await;

        let content = json!({ "body": "{posts} across {tags}" });
        let data = fetch_interpolated_data(&registry, &content, None).await;

        assert_eq!(data.get("postCount"), Some(&json!(7)));
        assert_eq!(data.get("tagCount"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_failing_interpolator_isolated() {
        let registry = registry_with(vec![
            Arc::new(FixedInterpolator {
                name: "posts",
                entries: vec![("postCount", json!(7))],
            }),
            Arc::new(FailingInterpolator),
        ])
        .await;

        let content = json!("{posts} and {broken}");
        let (data, diagnostics) =
            fetch_interpolated_data_with_diagnostics(&registry, &content, None).await;

        assert_eq!(data.get("postCount"), Some(&json!(7)));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].placeholder, "broken");
    }

    #[tokio::test]
    async fn test_unknown_name_is_noop() {
        let registry = registry_with(vec![]).await;

        let content = json!("{madeUp}");
        let (data, diagnostics) =
            fetch_interpolated_data_with_diagnostics(&registry, &content, None).await;

        assert!(data.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn test_context_attached_to_params() {
        let registry = registry_with(vec![Arc::new(EchoParamsInterpolator)]).await;
        let context = ContextData::new().with_slug("ctx-slug").with_page(4);

        let content = json!("{echo|slug=explicit}");
        let data = fetch_interpolated_data(&registry, &content, Some(&context)).await;

        // Explicit slug wins; ambient page is added.
        assert_eq!(data.get("slug"), Some(&json!("explicit")));
        assert_eq!(data.get("page"), Some(&json!("4")));
    }

    #[tokio::test]
    async fn test_colliding_keys_last_name_wins() {
        // Names resolve and merge in sorted order: "alpha" then "beta".
        let registry = registry_with(vec![
            Arc::new(FixedInterpolator {
                name: "alpha",
                entries: vec![("shared", json!("from-alpha"))],
            }),
            Arc::new(FixedInterpolator {
                name: "beta",
                entries: vec![("shared", json!("from-beta"))],
            }),
        ])
        .await;

        let content = json!("{beta} {alpha}");
        let data = fetch_interpolated_data(&registry, &content, None).await;

        assert_eq!(data.get("shared"), Some(&json!("from-beta")));
    }

    #[tokio::test]
    async fn test_duplicate_name_first_params_win() {
        let registry = registry_with(vec![Arc::new(EchoParamsInterpolator)]).await;

        let content = json!(["{echo|who=first}", "{echo|who=second}"]);
        let data = fetch_interpolated_data(&registry, &content, None).await;

        assert_eq!(data.get("who"), Some(&json!("first")));
    }
}
