//! Page discovery for file-based routing.
//!
//! This crate turns a page directory into a [`PageMap`]: one [`PageEntry`] per
//! file whose name carries a configured extension, with route segments parsed
//! from the directory structure and bracket conventions.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`PageSource`] trait with `scan()` and `watch()` methods
//! - [`FsPageSource`] implementation that walks the filesystem and watches it
//!   with `notify`
//! - [`MockPageSource`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use screens_pages::{FsPageSource, PageSource};
//!
//! let pages = FsPageSource::new().scan(&options)?;
//! for page in &pages {
//!     println!("{} -> {}", page.relative_path, page.route_key());
//! }
//! ```

mod debouncer;
mod error;
mod event;
#[cfg(feature = "mock")]
mod mock;
mod page;
mod scanner;
mod source;

pub use error::ScanError;
pub use event::{PageEvent, PageEventKind, PageEventReceiver, WatchHandle};
#[cfg(feature = "mock")]
pub use mock::MockPageSource;
pub use page::{PageEntry, PageMap, RouteSegment, page_file_path, relative_page_path, route_key};
pub use scanner::scan;
pub use source::{FsPageSource, PageSource, is_page_path, is_page_subtree};
