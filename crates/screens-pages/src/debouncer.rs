//! Event debouncing for page change notification.
//!
//! Coalesces bursts of watcher events into at most one event per path. The
//! latest kind wins: a pair of opposite events still emits one event, since a
//! scan may have run between them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::event::{PageEvent, PageEventKind};

/// Pending event waiting to be emitted.
struct PendingEvent {
    kind: PageEventKind,
    deadline: Instant,
}

/// Thread-safe event debouncer.
pub(crate) struct EventDebouncer {
    pending: Mutex<HashMap<PathBuf, PendingEvent>>,
    debounce_duration: Duration,
}

impl EventDebouncer {
    /// Create a new debouncer with the specified debounce duration.
    pub fn new(debounce_duration: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            debounce_duration,
        }
    }

    /// Record an event.
    ///
    /// Thread-safe, called from file system watcher callbacks.
    pub fn record(&self, path: PathBuf, kind: PageEventKind) {
        use std::collections::hash_map::Entry;

        let mut pending = self.pending.lock().unwrap();
        let deadline = Instant::now() + self.debounce_duration;

        match pending.entry(path) {
            Entry::Vacant(entry) => {
                entry.insert(PendingEvent { kind, deadline });
            }
            Entry::Occupied(mut entry) => {
                // Latest kind wins; opposite events never cancel out
                let event = entry.get_mut();
                event.kind = kind;
                event.deadline = deadline;
            }
        }
    }

    /// Drain events that have passed their debounce deadline.
    ///
    /// Events are returned in path order.
    pub fn drain_ready(&self) -> Vec<PageEvent> {
        let mut pending = self.pending.lock().unwrap();
        let now = Instant::now();

        let mut ready: Vec<PageEvent> = Vec::new();
        pending.retain(|path, event| {
            if event.deadline <= now {
                ready.push(PageEvent {
                    path: path.clone(),
                    kind: event.kind,
                });
                false
            } else {
                true
            }
        });
        ready.sort_by(|a, b| a.path.cmp(&b.path));
        ready
    }
}
