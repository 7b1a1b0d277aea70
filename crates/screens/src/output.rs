//! Terminal reporting for CLI commands.
//!
//! Status lines go to stderr. Generated modules and JSON go to stdout so they
//! can be piped.

use std::fmt::Display;
use std::io;
use std::path::Path;

use console::{Style, Term};

pub(crate) struct Output {
    status: Term,
    data: Term,
    written: Style,
    dim: Style,
    failed: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            status: Term::stderr(),
            data: Term::stdout(),
            written: Style::new().green(),
            dim: Style::new().dim(),
            failed: Style::new().red(),
        }
    }

    /// Announce the directory being watched.
    pub(crate) fn watching(&self, page_dir: &Path) {
        let line = format!("Watching {} for page changes", page_dir.display());
        let _ = self.status.write_line(&self.dim.apply_to(line).to_string());
    }

    /// Report the result of writing the routes module to `path`.
    pub(crate) fn wrote(&self, path: &Path, changed: bool) {
        let line = if changed {
            self.written
                .apply_to(format!("Wrote {}", path.display()))
                .to_string()
        } else {
            self.dim
                .apply_to(format!("{} is up to date", path.display()))
                .to_string()
        };
        let _ = self.status.write_line(&line);
    }

    /// Print an error in red.
    pub(crate) fn error(&self, err: &impl Display) {
        let line = format!("Error: {err}");
        let _ = self.status.write_line(&self.failed.apply_to(line).to_string());
    }

    /// Report a failed regeneration that leaves the previous output in place.
    pub(crate) fn kept_previous(&self, err: &impl Display, path: &Path) {
        self.error(err);
        let line = format!("Keeping {} until the next page change", path.display());
        let _ = self.status.write_line(&self.dim.apply_to(line).to_string());
    }

    /// Write command output verbatim to stdout.
    pub(crate) fn data(&self, text: &str) -> io::Result<()> {
        self.data.write_str(text)
    }
}
