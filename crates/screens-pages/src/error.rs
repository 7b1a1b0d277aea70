//! Scan error type.

use std::path::{Path, PathBuf};

/// Error raised while enumerating or watching the page directory.
///
/// A missing page directory is not an error; scans report it as an empty
/// [`PageMap`](crate::PageMap).
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// I/O failure while walking the directory (permission denied, etc.).
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file watcher could not be started.
    #[error("Failed to watch {}: {source}", path.display())]
    Watch {
        /// Directory that could not be watched.
        path: PathBuf,
        /// Underlying watcher error.
        #[source]
        source: notify::Error,
    },
}

impl ScanError {
    /// Create a scan error from an I/O error.
    #[must_use]
    pub fn io(source: std::io::Error, path: &Path) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Watch { path, .. } => path,
        }
    }
}
