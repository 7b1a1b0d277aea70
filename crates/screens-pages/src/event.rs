//! Page event types for change notification.
//!
//! Provides types for subscribing to page topology changes through the
//! [`PageSource::watch`](crate::PageSource::watch) method. Only additions and
//! removals are reported: editing an existing file never changes its route.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

/// Kind of page event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageEventKind {
    /// File was added.
    Added,
    /// File was removed.
    Removed,
}

/// A page change event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageEvent {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Kind of change.
    pub kind: PageEventKind,
}

impl PageEvent {
    /// Create an `Added` event.
    #[must_use]
    pub fn added(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: PageEventKind::Added,
        }
    }

    /// Create a `Removed` event.
    #[must_use]
    pub fn removed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: PageEventKind::Removed,
        }
    }
}

/// Receiver for page events.
///
/// Wraps a [`std::sync::mpsc::Receiver`] for synchronous event delivery.
pub struct PageEventReceiver {
    rx: mpsc::Receiver<PageEvent>,
}

impl PageEventReceiver {
    /// Create a new receiver from a channel receiver.
    pub(crate) fn new(rx: mpsc::Receiver<PageEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next event (blocking).
    ///
    /// Returns `None` when the sender is dropped.
    #[must_use]
    pub fn recv(&self) -> Option<PageEvent> {
        self.rx.recv().ok()
    }

    /// Try to receive an event without blocking.
    ///
    /// Returns `None` if no event is available or the sender is dropped.
    #[must_use]
    pub fn try_recv(&self) -> Option<PageEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event.
    ///
    /// Returns `Ok(None)` on timeout and `Err(())` once the sender is dropped.
    #[allow(clippy::result_unit_err)]
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<PageEvent>, ()> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(()),
        }
    }

    /// Returns an iterator over events.
    ///
    /// Blocks until an event is available. Stops when the sender is dropped.
    pub fn iter(&self) -> impl Iterator<Item = PageEvent> + '_ {
        self.rx.iter()
    }

    /// Create a no-op receiver that never yields events.
    ///
    /// Used by the default `PageSource::watch()` implementation for sources
    /// that don't support change notification.
    pub(crate) fn no_op() -> Self {
        let (_tx, rx) = mpsc::channel();
        Self { rx }
    }
}

/// Handle to stop watching for changes.
///
/// Dropping the handle stops watching. Shutdown is signalled by dropping the
/// internal channel sender.
pub struct WatchHandle {
    _shutdown: Option<mpsc::Sender<()>>,
}

impl WatchHandle {
    /// Create a new watch handle with a shutdown signal sender.
    pub(crate) fn new(shutdown: mpsc::Sender<()>) -> Self {
        Self {
            _shutdown: Some(shutdown),
        }
    }

    /// Stop watching immediately (consumes the handle).
    pub fn stop(mut self) {
        self._shutdown.take();
    }

    /// Create a no-op handle that does nothing on drop.
    pub(crate) fn no_op() -> Self {
        Self { _shutdown: None }
    }
}
