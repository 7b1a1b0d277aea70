//! Cached route module with event-driven invalidation.
//!
//! [`RouteContext`] owns the only mutable state of the system: the page map
//! from the most recent scan. It moves between two states:
//!
//! - `Empty`: the next request scans the page directory
//! - `Populated`: requests regenerate the module from the cached page map
//!
//! A relevant file event returns the context to `Empty` and asks the host to
//! drop its cached module. Generation always re-runs, so option changes show
//! up immediately; only the directory walk is cached.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use screens_config::ResolvedOptions;
use screens_pages::{
    PageEvent, PageEventKind, PageEventReceiver, PageMap, PageSource, ScanError, WatchHandle,
    is_page_path, is_page_subtree,
};

use crate::codegen::generate;
use crate::error::RouteError;
use crate::host::{MODULE_ID, ModuleGraph, RESOLVED_MODULE_ID};
use crate::tree::{RouteNode, build_tree};

/// Cache state of a [`RouteContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    /// No page map cached; the next request scans.
    Empty,
    /// Page map from the most recent scan is cached.
    Populated,
}

/// True if a file event for `path` can change the route tree.
///
/// The path must lie under the page directory, carry a configured extension
/// and have no hidden component. Relative paths are resolved against the
/// project root.
#[must_use]
pub fn is_target(path: &Path, options: &ResolvedOptions) -> bool {
    is_page_path(&absolute(path, options), options)
}

fn absolute(path: &Path, options: &ResolvedOptions) -> PathBuf {
    if path.is_relative() {
        options.root.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Route module cache for one page directory.
///
/// # Thread Safety
///
/// Designed for concurrent access without external locking:
/// - `RwLock<Option<Arc<PageMap>>>` holds the cached page map
/// - `Mutex<()>` serializes scans so concurrent requests trigger one walk
/// - `AtomicU64` epoch is bumped by every invalidation
///
/// Invalidation never waits for a scan. A scan that started before an
/// invalidation still answers its own request but is not cached.
pub struct RouteContext {
    source: Arc<dyn PageSource>,
    host: Arc<dyn ModuleGraph>,
    options: RwLock<Arc<ResolvedOptions>>,
    /// Cached page map (`None` in the `Empty` state).
    pages: RwLock<Option<Arc<PageMap>>>,
    /// Mutex for serializing scans.
    scan_lock: Mutex<()>,
    /// Bumped under the `pages` write lock on every invalidation.
    epoch: AtomicU64,
}

impl RouteContext {
    /// Create a context in the `Empty` state.
    ///
    /// # Arguments
    ///
    /// * `options` - Resolved options
    /// * `source` - Page source used for scans and watching
    /// * `host` - Module graph notified on invalidation
    #[must_use]
    pub fn new(
        options: ResolvedOptions,
        source: Arc<dyn PageSource>,
        host: Arc<dyn ModuleGraph>,
    ) -> Self {
        Self {
            source,
            host,
            options: RwLock::new(Arc::new(options)),
            pages: RwLock::new(None),
            scan_lock: Mutex::new(()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Current options snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn options(&self) -> Arc<ResolvedOptions> {
        Arc::clone(&self.options.read().unwrap())
    }

    /// Current cache state.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn state(&self) -> CacheState {
        if self.pages.read().unwrap().is_some() {
            CacheState::Populated
        } else {
            CacheState::Empty
        }
    }

    /// Generate the routes module source.
    ///
    /// Scans only in the `Empty` state. On error the cache is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] if scanning, tree building or generation fails.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn request(&self) -> Result<String, RouteError> {
        self.with_pages(|pages, options| {
            let start = Instant::now();
            let routes = build_tree(pages, options)?;
            let source = generate(&routes, options)?;
            tracing::debug!(
                page_count = pages.len(),
                bytes = source.len(),
                elapsed_ms = start.elapsed().as_millis(),
                "Generated routes module"
            );
            Ok(source)
        })
    }

    /// Build the route tree without generating source.
    ///
    /// Shares the page map cache with [`request`](Self::request).
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] if scanning or tree building fails.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn routes(&self) -> Result<Vec<RouteNode>, RouteError> {
        self.with_pages(|pages, options| Ok(build_tree(pages, options)?))
    }

    /// Handle a watcher event.
    ///
    /// Relevant events clear the cache and invalidate the virtual module in
    /// the host. Returns whether the event was relevant.
    ///
    /// Besides page files, removing a directory under the page directory is
    /// relevant if cached pages live below it (or nothing is cached), since
    /// moving a directory out is reported for the directory alone.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn file_event(&self, path: &Path, kind: PageEventKind) -> bool {
        let options = self.options();
        let relevant = is_target(path, &options)
            || (kind == PageEventKind::Removed && self.removes_cached_pages(path, &options));
        if !relevant {
            tracing::trace!(path = %path.display(), ?kind, "Ignoring file event");
            return false;
        }

        self.invalidate();
        self.host.invalidate(RESOLVED_MODULE_ID);
        tracing::debug!(path = %path.display(), ?kind, "Page topology changed");
        true
    }

    /// Handle a [`PageEvent`] from a page source watcher.
    ///
    /// See [`file_event`](Self::file_event).
    pub fn handle_event(&self, event: &PageEvent) -> bool {
        self.file_event(&event.path, event.kind)
    }

    /// Start watching the page directory through the page source.
    ///
    /// Feed the received events to [`handle_event`](Self::handle_event).
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the watcher cannot be started.
    pub fn watch(&self) -> Result<(PageEventReceiver, WatchHandle), ScanError> {
        self.source.watch(&self.options())
    }

    /// Replace the options.
    ///
    /// The cache is cleared only if the new options scan differently. The host
    /// is always told to drop the module, since every option can change the
    /// generated source.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn set_options(&self, options: ResolvedOptions) {
        let rescan = {
            let mut current = self.options.write().unwrap();
            let rescan = !current.same_scan(&options);
            *current = Arc::new(options);
            rescan
        };

        if rescan {
            self.invalidate();
        }
        self.host.invalidate(RESOLVED_MODULE_ID);
        tracing::debug!(rescan, "Options updated");
    }

    /// Resolve a module id requested by the host.
    ///
    /// Returns the resolved id for [`MODULE_ID`], `None` for anything else.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn resolve_id(&self, id: &str) -> Option<&'static str> {
        (id == MODULE_ID).then_some(RESOLVED_MODULE_ID)
    }

    /// Load a resolved module id.
    ///
    /// Returns `Ok(None)` for ids this context doesn't own.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] if the routes module cannot be generated.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn load(&self, id: &str) -> Result<Option<String>, RouteError> {
        if id != RESOLVED_MODULE_ID {
            return Ok(None);
        }
        self.request().map(Some)
    }

    /// Clear the cached page map.
    ///
    /// Bumps the epoch under the cache write lock so in-flight scans see it.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn invalidate(&self) {
        let mut pages = self.pages.write().unwrap();
        *pages = None;
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// True if removing `path` as a directory could drop a route.
    fn removes_cached_pages(&self, path: &Path, options: &ResolvedOptions) -> bool {
        let dir = absolute(path, options);
        if !is_page_subtree(&dir, options) {
            return false;
        }
        self.cached_pages()
            .is_none_or(|pages| pages.iter().any(|page| page.file_path.starts_with(&dir)))
    }

    fn cached_pages(&self) -> Option<Arc<PageMap>> {
        self.pages.read().unwrap().clone()
    }

    /// Run `f` on the cached page map, scanning first in the `Empty` state.
    ///
    /// A fresh scan is cached only if `f` succeeds and no invalidation
    /// happened since the scan started.
    fn with_pages<T>(
        &self,
        f: impl FnOnce(&PageMap, &ResolvedOptions) -> Result<T, RouteError>,
    ) -> Result<T, RouteError> {
        // Fast path: cache populated
        if let Some(pages) = self.cached_pages() {
            return f(&pages, &self.options());
        }

        // Slow path: acquire scan lock
        let _guard = self.scan_lock.lock().unwrap();

        // Double-check after acquiring lock
        if let Some(pages) = self.cached_pages() {
            return f(&pages, &self.options());
        }

        // Epoch before options: a later options change bumps it
        let epoch = self.epoch.load(Ordering::Acquire);
        let options = self.options();

        let start = Instant::now();
        let pages = Arc::new(self.source.scan(&options)?);
        tracing::info!(
            page_dir = %options.page_dir.display(),
            page_count = pages.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Scanned pages"
        );

        let result = f(&pages, &options)?;

        let mut cache = self.pages.write().unwrap();
        if self.epoch.load(Ordering::Acquire) == epoch {
            *cache = Some(pages);
        } else {
            tracing::warn!(
                page_dir = %options.page_dir.display(),
                "Discarding page scan invalidated while in flight"
            );
        }

        Ok(result)
    }
}
