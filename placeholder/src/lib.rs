//! Placeholder syntax for NeutralPress block content.
//!
//! Content authors embed dynamic values in free text as `{name}` or
//! `{name|k1=v1&k2=v2}` tokens. This crate owns everything about that syntax
//! that does not require I/O:
//!
//! - [`parse`]: lenient scanning of placeholder tokens out of text
//! - [`Placeholder`]: the parsed descriptor, with canonical serialization
//! - [`ContextData`] / [`attach`]: ambient page context and how it is folded
//!   into a placeholder's parameters
//! - [`scan`]: generic traversal of the string leaves of a JSON content tree
//!
//! Parsing is best-effort by design: user-authored text must never fail to
//! render because of a stray brace, so malformed tokens are skipped rather
//! than reported.
//!
//! # Example
//!
//! ```
//! use placeholder::{attach, parse, ContextData};
//!
//! let tokens = parse("Browse {tagPosts|slug=rust} below");
//! let ctx = ContextData::new().with_page(2);
//! assert_eq!(attach(&tokens[0], &ctx), "{tagPosts|slug=rust&page=2}");
//! ```

pub mod context;
pub mod scan;
pub mod token;

// Re-export main types
pub use context::{attach, ContextData};
pub use scan::{collect_placeholders, visit_strings};
pub use token::{parse, Placeholder};
