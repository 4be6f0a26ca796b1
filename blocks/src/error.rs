//! Structured per-block resolution errors.
//!
//! A block that fails to resolve never fails the page: the failure is
//! captured here and attached to the block's envelope as an error marker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The stage of the envelope builder a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStage {
    /// Looking the block type up in the catalog
    DefinitionLookup,
    /// Batch placeholder resolution
    Placeholders,
    /// Media metadata resolution
    Media,
    /// The block type's business-data fetcher
    BusinessFetch,
    /// Combining stage outputs into the envelope
    Merge,
}

impl fmt::Display for ResolveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolveStage::DefinitionLookup => "definition-lookup",
            ResolveStage::Placeholders => "placeholders",
            ResolveStage::Media => "media",
            ResolveStage::BusinessFetch => "business-fetch",
            ResolveStage::Merge => "merge",
        };
        f.write_str(name)
    }
}

/// A per-block resolution failure.
///
/// Carried inside the envelope's meta section; the page render treats the
/// block as empty and an editor surface can show the marker to the author.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[error("block {block_type}[{block_id}] failed at {stage}: {message}")]
pub struct BlockRuntimeError {
    /// Stable machine-readable code, e.g. `source_error`
    pub code: String,
    /// Stage that failed
    pub stage: ResolveStage,
    /// Block type of the failing instance
    pub block_type: String,
    /// Display form of the failing instance's id
    pub block_id: String,
    /// Human-readable description
    pub message: String,
    /// Underlying error rendered to text, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl BlockRuntimeError {
    /// Build an error for one stage of one block instance.
    pub fn new(
        code: impl Into<String>,
        stage: ResolveStage,
        block_type: impl Into<String>,
        block_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            stage,
            block_type: block_type.into(),
            block_id: block_id.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying error.
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }
}
