//! Option resolution for screens.
//!
//! Merges user-supplied options with documented defaults into an immutable
//! [`ResolvedOptions`]. Options come from code ([`UserOptions`] built by the
//! host), from a `screens.toml` file discovered in the current directory or
//! its parents, and from CLI overrides ([`CliSettings`]).
//!
//! ## Environment Variable Expansion
//!
//! `page_dir` values loaded from a file support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "screens.toml";

/// Default page directory, relative to the project root.
pub const DEFAULT_PAGE_DIR: &str = "src/pages";

/// Default routable file extensions.
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["tsx", "jsx", "ts", "js"];

/// Default filename stem of index routes.
pub const DEFAULT_INDEX_NAME: &str = "index";

/// How page modules are referenced from the generated import statements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Absolute file-system path (`/home/me/app/src/pages/home.tsx`).
    #[default]
    Absolute,
    /// Path relative to the project root with a leading slash (`/src/pages/home.tsx`).
    Root,
}

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded options.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override page directory.
    pub page_dir: Option<PathBuf>,
    /// Override routable extensions.
    pub extensions: Option<Vec<String>>,
    /// Override lazy route loading.
    pub lazy: Option<bool>,
}

/// Partial, user-supplied options.
///
/// Every field is optional; [`resolve`] fills the gaps with defaults.
/// Unknown keys in `screens.toml` are rejected.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserOptions {
    /// Directory scanned for route files, relative to the project root.
    pub page_dir: Option<PathBuf>,
    /// File suffixes considered routable (with or without the leading dot).
    pub extensions: Option<Vec<String>>,
    /// Wrap page modules in deferred (lazy) loaders.
    #[serde(rename = "async")]
    pub lazy: Option<bool>,
    /// Filename stem that denotes an index route.
    pub index_name: Option<String>,
    /// How generated imports reference page modules.
    pub import_mode: Option<ImportMode>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Fully-specified options, computed once per process unless options change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedOptions {
    /// Project root the options were resolved against.
    pub root: PathBuf,
    /// Absolute, normalized page directory.
    pub page_dir: PathBuf,
    /// Routable extensions without leading dot, no duplicates.
    pub extensions: Vec<String>,
    /// Produce deferred (lazy) route definitions.
    pub lazy: bool,
    /// Filename stem that denotes an index route.
    pub index_name: String,
    /// How generated imports reference page modules.
    pub import_mode: ImportMode,
}

impl ResolvedOptions {
    /// Strip the longest configured extension from a file name.
    ///
    /// Returns the remaining stem, or `None` if the name carries no configured
    /// extension or nothing would remain.
    ///
    /// ```
    /// # use screens_config::ResolvedOptions;
    /// # let mut options = ResolvedOptions::for_dir("/app/src/pages");
    /// options.extensions = vec!["tsx".to_owned(), "page.tsx".to_owned()];
    /// assert_eq!(options.strip_extension("home.page.tsx"), Some("home"));
    /// assert_eq!(options.strip_extension("home.tsx"), Some("home"));
    /// assert_eq!(options.strip_extension("home.css"), None);
    /// ```
    #[must_use]
    pub fn strip_extension<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        self.extensions
            .iter()
            .filter_map(|ext| {
                let stem = file_name.strip_suffix(ext.as_str())?.strip_suffix('.')?;
                (!stem.is_empty()).then_some(stem)
            })
            .min_by_key(|stem| stem.len())
    }

    /// Whether two option sets scan the same files into the same entries.
    #[must_use]
    pub fn same_scan(&self, other: &Self) -> bool {
        self.page_dir == other.page_dir
            && self.extensions == other.extensions
            && self.index_name == other.index_name
    }

    /// Options with defaults for an already-resolved page directory.
    ///
    /// Performs no validation; intended for hosts and tests that manage the
    /// directory themselves.
    #[must_use]
    pub fn for_dir(page_dir: impl Into<PathBuf>) -> Self {
        let page_dir = page_dir.into();
        Self {
            root: page_dir.clone(),
            page_dir,
            extensions: DEFAULT_EXTENSIONS.iter().map(|&e| e.to_owned()).collect(),
            lazy: false,
            index_name: DEFAULT_INDEX_NAME.to_owned(),
            import_mode: ImportMode::Absolute,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Page directory does not exist.
    #[error("Page directory not found: {}", .0.display())]
    PageDirNotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`page_dir`").
        field: String,
        /// Error message (e.g., "${`PAGES`} not set").
        message: String,
    },
}

/// Merge user options with defaults.
///
/// `root` is the project root; a relative page directory is resolved against
/// it. The page directory must exist: this is the only place its existence is
/// checked (a later scan of a vanished directory yields no pages).
///
/// # Errors
///
/// Returns [`ConfigError::PageDirNotFound`] if the page directory does not
/// exist and [`ConfigError::Validation`] for empty extensions or index name.
pub fn resolve(user: Option<&UserOptions>, root: &Path) -> Result<ResolvedOptions, ConfigError> {
    let defaults = UserOptions::default();
    let user = user.unwrap_or(&defaults);

    let root = root
        .canonicalize()
        .or_else(|_| std::path::absolute(root))?;

    let page_dir = root.join(
        user.page_dir
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_PAGE_DIR)),
    );
    let page_dir = match page_dir.canonicalize() {
        Ok(dir) if dir.is_dir() => dir,
        Ok(dir) => {
            return Err(ConfigError::Validation(format!(
                "page_dir is not a directory: {}",
                dir.display()
            )));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::PageDirNotFound(page_dir));
        }
        Err(e) => return Err(ConfigError::Io(e)),
    };

    let extensions = match &user.extensions {
        Some(extensions) => normalize_extensions(extensions)?,
        None => DEFAULT_EXTENSIONS.iter().map(|&e| e.to_owned()).collect(),
    };

    let index_name = user
        .index_name
        .clone()
        .unwrap_or_else(|| DEFAULT_INDEX_NAME.to_owned());
    require_non_empty(&index_name, "index_name")?;

    let resolved = ResolvedOptions {
        root,
        page_dir,
        extensions,
        lazy: user.lazy.unwrap_or(false),
        index_name,
        import_mode: user.import_mode.unwrap_or_default(),
    };
    tracing::debug!(
        page_dir = %resolved.page_dir.display(),
        extensions = ?resolved.extensions,
        lazy = resolved.lazy,
        "Options resolved"
    );
    Ok(resolved)
}

/// Strip leading dots and drop duplicates, keeping first occurrences.
fn normalize_extensions(extensions: &[String]) -> Result<Vec<String>, ConfigError> {
    if extensions.is_empty() {
        return Err(ConfigError::Validation(
            "extensions cannot be empty".to_owned(),
        ));
    }

    let mut normalized: Vec<String> = Vec::with_capacity(extensions.len());
    for ext in extensions {
        let ext = ext.trim().trim_start_matches('.');
        require_non_empty(ext, "extensions")?;
        if !normalized.iter().any(|e| e == ext) {
            normalized.push(ext.to_owned());
        }
    }
    Ok(normalized)
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl UserOptions {
    /// Load options from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `screens.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut options = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            options.apply_cli_settings(settings);
        }

        Ok(options)
    }

    /// Project root these options are relative to.
    ///
    /// The config file's directory when loaded from a file, otherwise the
    /// current working directory.
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.config_path
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(
                || std::env::current_dir().unwrap_or_default(),
                Path::to_path_buf,
            )
    }

    /// Search for config file in `start` and its parents.
    #[must_use]
    pub fn discover(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Apply CLI settings to the options.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(page_dir) = &settings.page_dir {
            // CLI paths are relative to the working directory, not the config file
            self.page_dir = Some(std::path::absolute(page_dir).unwrap_or_else(|_| page_dir.clone()));
        }
        if let Some(extensions) = &settings.extensions {
            self.extensions = Some(extensions.clone());
        }
        if let Some(lazy) = settings.lazy {
            self.lazy = Some(lazy);
        }
    }

    /// Load options from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut options: Self = toml::from_str(&content)?;

        if let Some(page_dir) = &options.page_dir {
            let raw = page_dir.to_string_lossy();
            options.page_dir = Some(PathBuf::from(expand::expand_env(&raw, "page_dir")?));
        }
        options.config_path = Some(path.to_path_buf());

        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(options)
    }
}
