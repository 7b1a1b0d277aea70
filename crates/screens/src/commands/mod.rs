//! CLI command implementations.

pub(crate) mod generate;
pub(crate) mod tree;
pub(crate) mod watch;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use screens_config::{CliSettings, ResolvedOptions, UserOptions};
use screens_pages::FsPageSource;
use screens_routes::{NullModuleGraph, RouteContext};

pub(crate) use generate::GenerateArgs;
pub(crate) use tree::TreeArgs;
pub(crate) use watch::WatchArgs;

use crate::error::CliError;

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct OptionArgs {
    /// Path to configuration file (default: auto-discover screens.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Page directory (overrides config).
    #[arg(short, long)]
    page_dir: Option<PathBuf>,

    /// Routable extensions, comma-separated (overrides config).
    #[arg(short, long, value_delimiter = ',')]
    extensions: Option<Vec<String>>,

    /// Load pages lazily with `React.lazy`.
    #[arg(long)]
    lazy: bool,

    /// Import pages eagerly (overrides `async = true` in config).
    #[arg(long, conflicts_with = "lazy")]
    eager: bool,
}

impl OptionArgs {
    /// Resolve `lazy` from --lazy/--eager flags.
    fn resolve_lazy(&self) -> Option<bool> {
        self.eager
            .then_some(false)
            .or_else(|| self.lazy.then_some(true))
    }

    /// Load the config file, apply CLI overrides and resolve.
    pub(crate) fn resolve(self) -> Result<ResolvedOptions, CliError> {
        let lazy = self.resolve_lazy();
        let cli_settings = CliSettings {
            page_dir: self.page_dir,
            extensions: self.extensions,
            lazy,
        };
        let user = UserOptions::load(self.config.as_deref(), Some(&cli_settings))?;
        Ok(screens_config::resolve(Some(&user), &user.root())?)
    }
}

/// Route context over the real file system, for commands without a host.
fn fs_context(options: ResolvedOptions) -> RouteContext {
    RouteContext::new(
        options,
        Arc::new(FsPageSource::new()),
        Arc::new(NullModuleGraph),
    )
}

/// Write generated source to `path`, creating parent directories.
///
/// Returns `false` without touching the file if it already holds `source`.
fn write_output(path: &Path, source: &str) -> Result<bool, CliError> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == source) {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, source)?;
    Ok(true)
}
