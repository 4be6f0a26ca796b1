//! NeutralPress block pipeline.
//!
//! Turns a page's ordered list of block instances into runtime envelopes:
//! per block, the catalog supplies a capability descriptor, then
//! placeholder interpolation and media resolution run concurrently, then
//! the block type's fetcher produces business data, and everything merges
//! into one read-only envelope for the rendering layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             BlockPipeline               │
//! │   (main entry point for resolution)     │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┼───────────────┐
//!      ▼           ▼               ▼
//! ┌─────────┐ ┌──────────────┐ ┌──────────────┐
//! │ Block   │ │ Envelope     │ │ Interpolator │
//! │ Catalog │ │ Builder      │ │ Registry     │
//! └─────────┘ └──────┬───────┘ └──────────────┘
//!                    │
//!          ┌─────────┴─────────┐
//!          ▼                   ▼
//!   ┌─────────────┐     ┌─────────────┐
//!   │ ImageService│     │ ContentSource│
//!   │ (host CDN)  │     │ (host DB)    │
//!   └─────────────┘     └─────────────┘
//! ```
//!
//! Failure isolation is per block instance: a failing stage marks that
//! block's envelope with a structured error and the rest of the page
//! resolves normally.

pub mod builtin;
pub mod capability;
pub mod catalog;
pub mod component;
pub mod config;
pub mod definition;
pub mod envelope;
pub mod error;
pub mod fetcher;
pub mod media;
pub mod merge;
pub mod pipeline;
pub mod schema;

// Re-export main types for convenience
pub use capability::{
    Capabilities, ContextMode, MediaCapability, MediaKind, PlaceholderPolicy, PlaceholderSource,
};
pub use catalog::BlockCatalog;
pub use component::BlockComponent;
pub use config::{PipelineConfig, ResolverConfig, SiteConfig};
pub use definition::{BlockDefinition, Loader};
pub use envelope::{
    flatten_runtime, BlockId, BlockInstance, EnvelopeBuilder, EnvelopeMeta, ResolutionStatus,
    ResolvedBlock, RuntimeEnvelope,
};
pub use error::{BlockRuntimeError, ResolveStage};
pub use fetcher::{Fetcher, FriendLinksFetcher, PaginationFetcher, PostsListFetcher};
pub use media::{ImageService, MediaError, MockImageService, ProcessedImage};
pub use pipeline::BlockPipeline;
pub use schema::{FieldKind, FormConfig, FormField};
