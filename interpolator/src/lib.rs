//! Interpolator layer - turning placeholders into data.
//!
//! Provides the async side of placeholder resolution:
//! - Trait-based content sources ([`ContentSource`]) with a mock for tests
//! - A registry of lazily loaded interpolators keyed by placeholder name
//! - The built-in site-scope and entity-scope interpolators
//! - Batch resolution over a whole block content tree
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        fetch_interpolated_data          │
//! │   (scan → attach context → dedupe)      │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┴───────────┐
//!      ▼                       ▼
//! ┌─────────────┐       ┌─────────────┐
//! │ Interpolator│       │ ContentSource│
//! │ Registry    │──────▶│ (database)   │
//! └─────────────┘       └─────────────┘
//! ```
//!
//! One failing interpolator never fails the batch: its keys are omitted and
//! the failure is logged (and optionally surfaced as a diagnostic).

pub mod batch;
pub mod builtin;
pub mod mock;
pub mod pagination;
pub mod registry;
pub mod source;

// Re-export main types for convenience
pub use batch::{
    fetch_interpolated_data, fetch_interpolated_data_with_diagnostics, InterpolationDiagnostic,
};
pub use builtin::{builtin_registry, DEFAULT_PAGE_SIZE};
pub use mock::MockContentSource;
pub use pagination::PageWindow;
pub use registry::{Interpolator, InterpolatorRegistry, LazyInterpolator};
pub use source::{
    CategoryEntity, ContentSource, FriendLink, PostSummary, SourceError, TagEntity,
};
