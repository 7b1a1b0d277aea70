//! Route tree, code generation and cache invalidation for file-based routing.
//!
//! Turns a [`PageMap`](screens_pages::PageMap) into a nested route tree and the
//! tree into a generated ES module, and keeps that module fresh while pages are
//! added and removed.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`build_tree`] grouping pages into [`RouteNode`]s with collision detection
//! - [`generate`] rendering the routes module source
//! - [`RouteContext`] caching the page scan and invalidating it on file events
//! - [`ModuleGraph`] trait for the host that caches the generated module
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use screens_pages::FsPageSource;
//! use screens_routes::{NullModuleGraph, RouteContext};
//!
//! let ctx = RouteContext::new(options, Arc::new(FsPageSource::new()), Arc::new(NullModuleGraph));
//! let source = ctx.request()?;
//! ```

mod codegen;
mod context;
mod error;
mod host;
mod tree;

pub use codegen::{GenerationError, generate};
pub use context::{CacheState, RouteContext, is_target};
pub use error::RouteError;
pub use host::{MODULE_ID, ModuleGraph, NullModuleGraph, RESOLVED_MODULE_ID};
pub use tree::{CollisionError, NodeSegment, RouteNode, build_tree};
