//! CLI error types.

use screens_config::ConfigError;
use screens_pages::ScanError;
use screens_routes::RouteError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Route(#[from] RouteError),

    #[error("{0}")]
    Scan(#[from] ScanError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
