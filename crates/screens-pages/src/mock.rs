//! Mock page source for testing.
//!
//! Provides [`MockPageSource`] for unit testing without filesystem access.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock, mpsc};

use screens_config::ResolvedOptions;

use crate::error::ScanError;
use crate::event::{PageEvent, PageEventReceiver, WatchHandle};
use crate::page::{PageEntry, PageMap, page_file_path};
use crate::source::PageSource;

type ScanHook = Box<dyn FnOnce() + Send>;

/// Active subscription: event sender plus the page directory it watches.
struct Subscription {
    sender: mpsc::Sender<PageEvent>,
    page_dir: PathBuf,
}

/// Mock page source for testing.
///
/// Holds relative page paths in memory. Files are filtered by the configured
/// extensions at scan time, exactly like the filesystem scanner.
///
/// # Example
///
/// ```ignore
/// use screens_pages::{MockPageSource, PageSource};
///
/// let source = MockPageSource::new()
///     .with_file("index.tsx")
///     .with_file("users/[id].tsx");
///
/// let pages = source.scan(&options)?;
/// assert_eq!(pages.len(), 2);
/// ```
#[derive(Default)]
pub struct MockPageSource {
    files: RwLock<BTreeSet<String>>,
    scan_count: AtomicUsize,
    fail_next_scan: AtomicBool,
    scan_hook: Mutex<Option<ScanHook>>,
    subscription: RwLock<Option<Subscription>>,
}

impl MockPageSource {
    /// Create a new empty mock source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file by path relative to the page directory.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, relative_path: impl Into<String>) -> Self {
        self.files.write().unwrap().insert(relative_path.into());
        self
    }

    /// Add a file and emit an `Added` event if watching.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn add_file(&self, relative_path: &str) {
        self.files.write().unwrap().insert(relative_path.to_owned());
        self.emit_relative(relative_path, PageEvent::added);
    }

    /// Remove a file and emit a `Removed` event if watching.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn remove_file(&self, relative_path: &str) {
        self.files.write().unwrap().remove(relative_path);
        self.emit_relative(relative_path, PageEvent::removed);
    }

    /// Number of scans performed so far.
    #[must_use]
    pub fn scan_count(&self) -> usize {
        self.scan_count.load(Ordering::SeqCst)
    }

    /// Make the next scan fail with a permission error.
    pub fn fail_next_scan(&self) {
        self.fail_next_scan.store(true, Ordering::SeqCst);
    }

    /// Run `hook` in the middle of the next scan, after the file set has been
    /// read but before the scan returns.
    ///
    /// Lets tests change the file set while a scan is in flight.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn on_next_scan(&self, hook: impl FnOnce() + Send + 'static) {
        *self.scan_hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// Emit an event to the watcher, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn emit(&self, event: PageEvent) {
        if let Some(subscription) = self.subscription.read().unwrap().as_ref() {
            let _ = subscription.sender.send(event);
        }
    }

    fn emit_relative(&self, relative_path: &str, make: fn(PathBuf) -> PageEvent) {
        let event = self
            .subscription
            .read()
            .unwrap()
            .as_ref()
            .map(|s| make(page_file_path(&s.page_dir, relative_path)));
        if let Some(event) = event {
            self.emit(event);
        }
    }
}

impl PageSource for MockPageSource {
    fn scan(&self, options: &ResolvedOptions) -> Result<PageMap, ScanError> {
        self.scan_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_next_scan.swap(false, Ordering::SeqCst) {
            return Err(ScanError::io(
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "mock failure"),
                &options.page_dir,
            ));
        }

        let pages: PageMap = self
            .files
            .read()
            .unwrap()
            .iter()
            .filter(|path| !path.split('/').any(|c| c.starts_with('.')))
            .filter_map(|path| PageEntry::from_relative(path, options))
            .collect();

        let hook = self.scan_hook.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }

        Ok(pages)
    }

    fn watch(
        &self,
        options: &ResolvedOptions,
    ) -> Result<(PageEventReceiver, WatchHandle), ScanError> {
        let (tx, rx) = mpsc::channel();
        *self.subscription.write().unwrap() = Some(Subscription {
            sender: tx,
            page_dir: options.page_dir.clone(),
        });
        let (shutdown_tx, _shutdown_rx) = mpsc::channel();
        Ok((PageEventReceiver::new(rx), WatchHandle::new(shutdown_tx)))
    }
}
