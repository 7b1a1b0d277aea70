//! Page sources: where pages come from and how their changes are observed.

use std::path::Path;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecursiveMode, Watcher};
use screens_config::ResolvedOptions;

use crate::debouncer::EventDebouncer;
use crate::error::ScanError;
use crate::event::{PageEvent, PageEventKind, PageEventReceiver, WatchHandle};
use crate::page::{PageMap, relative_page_path};
use crate::scanner;

/// Default debounce window for filesystem events.
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Abstraction over page discovery.
///
/// The route context only needs a snapshot of the page set and, optionally,
/// a stream of topology changes. Implementations must be safe to share
/// between the request path and the watcher thread.
pub trait PageSource: Send + Sync {
    /// Enumerate all pages under `options.page_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the page directory cannot be read.
    fn scan(&self, options: &ResolvedOptions) -> Result<PageMap, ScanError>;

    /// Start watching for page additions and removals.
    ///
    /// Events carry absolute file paths. Default implementation returns a
    /// no-op receiver for sources that don't support change notification.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if watching cannot be started.
    fn watch(
        &self,
        _options: &ResolvedOptions,
    ) -> Result<(PageEventReceiver, WatchHandle), ScanError> {
        Ok((PageEventReceiver::no_op(), WatchHandle::no_op()))
    }
}

/// Filesystem page source backed by `notify`.
#[derive(Clone, Debug)]
pub struct FsPageSource {
    debounce: Duration,
}

impl FsPageSource {
    /// Create a filesystem source with the default debounce window.
    #[must_use]
    pub fn new() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Override the debounce window.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

impl Default for FsPageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSource for FsPageSource {
    fn scan(&self, options: &ResolvedOptions) -> Result<PageMap, ScanError> {
        scanner::scan(options)
    }

    fn watch(
        &self,
        options: &ResolvedOptions,
    ) -> Result<(PageEventReceiver, WatchHandle), ScanError> {
        let (event_tx, event_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel();
        let debouncer = Arc::new(EventDebouncer::new(self.debounce));

        let filter_options = options.clone();
        let watcher_debouncer = Arc::clone(&debouncer);
        let mut watcher = notify::recommended_watcher(move |res| {
            record_notify_events(res, &watcher_debouncer, &filter_options);
        })
        .map_err(|e| watch_error(e, &options.page_dir))?;

        watcher
            .watch(&options.page_dir, RecursiveMode::Recursive)
            .map_err(|e| watch_error(e, &options.page_dir))?;

        tracing::debug!(page_dir = %options.page_dir.display(), "Watching page directory");

        // Spawn drain thread. The watcher is moved in to keep it alive.
        std::thread::spawn(move || {
            let _watcher = watcher;

            loop {
                match shutdown_rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                }

                for event in debouncer.drain_ready() {
                    if event_tx.send(event).is_err() {
                        return;
                    }
                }
            }
        });

        // When dropped, shutdown_tx disconnects, causing the drain thread to exit
        Ok((
            PageEventReceiver::new(event_rx),
            WatchHandle::new(shutdown_tx),
        ))
    }
}

fn watch_error(source: notify::Error, page_dir: &Path) -> ScanError {
    ScanError::Watch {
        path: page_dir.to_path_buf(),
        source,
    }
}

/// Map a `notify` event to topology changes.
///
/// Content modifications are dropped. A rename reports the old name as
/// removed and the new name as added. Backends that can't tell the two
/// halves apart (`RenameMode::Any`, e.g. `FSEvents`) are resolved by whether
/// the path still exists.
fn page_events(event: notify::Event) -> Vec<PageEvent> {
    match event.kind {
        EventKind::Create(_) => event.paths.into_iter().map(PageEvent::added).collect(),
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.into_iter().map(PageEvent::removed).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.into_iter().map(PageEvent::added).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.into_iter();
            let from = paths.next().map(PageEvent::removed);
            let to = paths.next().map(PageEvent::added);
            from.into_iter().chain(to).collect()
        }
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .into_iter()
            .map(|path| {
                if path.exists() {
                    PageEvent::added(path)
                } else {
                    PageEvent::removed(path)
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Process a notify event result, recording page events into the debouncer.
///
/// A directory that appears in one piece (moved in) is expanded into an
/// `Added` event per page inside it. A removed path that may have been a
/// directory is recorded as is; the watcher only sees the directory itself
/// when it is moved out.
fn record_notify_events(
    res: Result<notify::Event, notify::Error>,
    debouncer: &EventDebouncer,
    options: &ResolvedOptions,
) {
    let event = match res {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "File watcher error");
            return;
        }
    };
    for PageEvent { path, kind } in page_events(event) {
        match kind {
            PageEventKind::Added if is_page_subtree(&path, options) && path.is_dir() => {
                match scanner::scan_subtree(&path, options) {
                    Ok(pages) => {
                        for page in &pages {
                            debouncer.record(page.file_path.clone(), PageEventKind::Added);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to scan added directory"
                        );
                    }
                }
            }
            PageEventKind::Added if is_page_path(&path, options) => debouncer.record(path, kind),
            PageEventKind::Removed
                if is_page_path(&path, options) || is_page_subtree(&path, options) =>
            {
                debouncer.record(path, kind);
            }
            PageEventKind::Added | PageEventKind::Removed => {}
        }
    }
}

/// Relative path of `path` inside the page directory, if it has no hidden
/// component.
fn visible_relative_path(path: &Path, options: &ResolvedOptions) -> Option<String> {
    let relative = relative_page_path(path, &options.page_dir)?;
    (!relative.split('/').any(|c| c.starts_with('.'))).then_some(relative)
}

/// True if `path` could be a page: inside the page directory, not hidden,
/// and carrying a configured extension.
pub fn is_page_path(path: &Path, options: &ResolvedOptions) -> bool {
    let Some(relative) = visible_relative_path(path, options) else {
        return false;
    };
    let file_name = relative.rsplit('/').next().unwrap_or(&relative);
    options.strip_extension(file_name).is_some()
}

/// True if `path` could be a directory holding pages: inside the page
/// directory, not hidden, and not itself a page file.
///
/// Moving such a directory in or out changes every route below it, but the
/// watcher reports only the directory path.
pub fn is_page_subtree(path: &Path, options: &ResolvedOptions) -> bool {
    visible_relative_path(path, options).is_some() && !is_page_path(path, options)
}
