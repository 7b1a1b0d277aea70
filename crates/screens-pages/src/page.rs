//! Page entries and route key derivation.
//!
//! # Route Key Convention
//!
//! Keys are derived from the path relative to the page directory:
//! - `home.tsx` -> `/home`
//! - `home/settings.tsx` -> `/home/settings`
//! - `home/index.tsx` -> `/home`
//! - `index.tsx` -> `/`
//! - `users/[id].tsx` -> `/users/:id`
//! - `docs/[...rest].tsx` -> `/docs/*`

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use screens_config::ResolvedOptions;
use serde::Serialize;

/// Bracketed segment: `[name]` or `[...name]`.
static BRACKET_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(\.\.\.)?([^\[\]/]+)\]$").expect("valid segment regex"));

/// One component of a route path, tagged once during scanning.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum RouteSegment {
    /// Literal path component.
    Static(String),
    /// `[name]`: captures one path component as parameter `name`.
    Dynamic(String),
    /// `[...name]`: captures the remainder of the path.
    CatchAll(String),
}

impl RouteSegment {
    /// Parse a file or directory name (extension already stripped).
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match BRACKET_SEGMENT.captures(name) {
            Some(caps) if caps.get(1).is_some() => Self::CatchAll(caps[2].to_owned()),
            Some(caps) => Self::Dynamic(caps[2].to_owned()),
            None => Self::Static(name.to_owned()),
        }
    }

    /// Parameter name captured by this segment, if any.
    #[must_use]
    pub fn param(&self) -> Option<&str> {
        match self {
            Self::Static(_) => None,
            Self::Dynamic(name) | Self::CatchAll(name) => Some(name),
        }
    }
}

impl fmt::Display for RouteSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(name) => f.write_str(name),
            Self::Dynamic(name) => write!(f, ":{name}"),
            Self::CatchAll(_) => f.write_str("*"),
        }
    }
}

/// One source file eligible for routing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageEntry {
    /// Absolute path to the source file.
    pub file_path: PathBuf,
    /// Path relative to the page directory, `/`-separated (e.g., "home/settings.tsx").
    pub relative_path: String,
    /// Route segments derived from directories and the file stem.
    /// Index files contribute no segment of their own.
    pub segments: Vec<RouteSegment>,
    /// True if the file stem equals the configured index name.
    pub is_index: bool,
}

impl PageEntry {
    /// Build an entry from a `/`-separated path relative to the page directory.
    ///
    /// Returns `None` if the file name does not carry a configured extension.
    #[must_use]
    pub fn from_relative(relative_path: &str, options: &ResolvedOptions) -> Option<Self> {
        let (dirs, file_name) = match relative_path.rsplit_once('/') {
            Some((dirs, name)) => (Some(dirs), name),
            None => (None, relative_path),
        };
        let stem = options.strip_extension(file_name)?;

        let mut segments: Vec<RouteSegment> = dirs
            .into_iter()
            .flat_map(|d| d.split('/'))
            .filter(|d| !d.is_empty())
            .map(RouteSegment::parse)
            .collect();

        let is_index = stem == options.index_name;
        if !is_index {
            segments.push(RouteSegment::parse(stem));
        }

        Some(Self {
            file_path: page_file_path(&options.page_dir, relative_path),
            relative_path: relative_path.to_owned(),
            segments,
            is_index,
        })
    }

    /// Normalized route key (e.g., "/home/settings", "/users/:id", "/").
    #[must_use]
    pub fn route_key(&self) -> String {
        route_key(&self.segments)
    }

    /// Names of the dynamic parameters this page captures, outermost first.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(RouteSegment::param)
    }
}

/// Join segments into a route key.
#[must_use]
pub fn route_key(segments: &[RouteSegment]) -> String {
    let mut key = String::from("/");
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            key.push('/');
        }
        key.push_str(&segment.to_string());
    }
    key
}

/// Inverse of [`relative_page_path`]: join a `/`-separated relative path onto `page_dir`.
#[must_use]
pub fn page_file_path(page_dir: &Path, relative_path: &str) -> PathBuf {
    relative_path
        .split('/')
        .filter(|c| !c.is_empty())
        .fold(page_dir.to_path_buf(), |path, c| path.join(c))
}

/// Convert a path under `page_dir` to the `/`-separated relative form.
///
/// Returns `None` for paths outside `page_dir` or with non-UTF-8 components.
#[must_use]
pub fn relative_page_path(path: &Path, page_dir: &Path) -> Option<String> {
    let relative = path.strip_prefix(page_dir).ok()?;
    let components: Option<Vec<&str>> = relative
        .components()
        .map(|c| match c {
            std::path::Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    let components = components?;
    (!components.is_empty()).then(|| components.join("/"))
}

/// Pages found by a scan, keyed by relative path.
///
/// Keys are unique by construction. Iteration order is the lexicographic order
/// of relative paths, so two scans of the same directory compare equal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageMap {
    entries: BTreeMap<String, PageEntry>,
}

impl PageMap {
    /// Create an empty page map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any entry with the same relative path.
    pub fn insert(&mut self, entry: PageEntry) {
        self.entries.insert(entry.relative_path.clone(), entry);
    }

    /// Look up an entry by relative path.
    #[must_use]
    pub fn get(&self, relative_path: &str) -> Option<&PageEntry> {
        self.entries.get(relative_path)
    }

    /// Number of pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no pages were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in relative path order.
    pub fn iter(&self) -> impl Iterator<Item = &PageEntry> {
        self.entries.values()
    }
}

impl FromIterator<PageEntry> for PageMap {
    fn from_iter<I: IntoIterator<Item = PageEntry>>(iter: I) -> Self {
        let mut map = Self::new();
        for entry in iter {
            map.insert(entry);
        }
        map
    }
}

impl<'a> IntoIterator for &'a PageMap {
    type Item = &'a PageEntry;
    type IntoIter = std::collections::btree_map::Values<'a, String, PageEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn options() -> ResolvedOptions {
        ResolvedOptions::for_dir("/app/src/pages")
    }

    fn entry(relative: &str) -> PageEntry {
        PageEntry::from_relative(relative, &options()).unwrap()
    }

    #[test]
    fn test_segment_parse() {
        assert_eq!(RouteSegment::parse("home"), RouteSegment::Static("home".to_owned()));
        assert_eq!(RouteSegment::parse("[id]"), RouteSegment::Dynamic("id".to_owned()));
        assert_eq!(
            RouteSegment::parse("[...rest]"),
            RouteSegment::CatchAll("rest".to_owned())
        );
        assert_eq!(RouteSegment::parse("[]"), RouteSegment::Static("[]".to_owned()));
        assert_eq!(
            RouteSegment::parse("[a]b"),
            RouteSegment::Static("[a]b".to_owned())
        );
    }

    #[test]
    fn test_route_key() {
        assert_eq!(entry("index.tsx").route_key(), "/");
        assert_eq!(entry("home.tsx").route_key(), "/home");
        assert_eq!(entry("home/index.tsx").route_key(), "/home");
        assert_eq!(entry("home/settings.tsx").route_key(), "/home/settings");
        assert_eq!(entry("users/[id].tsx").route_key(), "/users/:id");
        assert_eq!(entry("users/[id]/edit.jsx").route_key(), "/users/:id/edit");
        assert_eq!(entry("docs/[...rest].ts").route_key(), "/docs/*");
        assert_eq!(entry("index/index.tsx").route_key(), "/index");
    }

    #[test]
    fn test_from_relative_index_attaches_to_directory() {
        let page = entry("home/index.tsx");

        assert!(page.is_index);
        assert_eq!(page.segments, vec![RouteSegment::Static("home".to_owned())]);
        assert_eq!(page.file_path, PathBuf::from("/app/src/pages/home/index.tsx"));
        assert_eq!(page.relative_path, "home/index.tsx");
    }

    #[test]
    fn test_from_relative_custom_index_name() {
        let mut options = options();
        options.index_name = "page".to_owned();

        let index = PageEntry::from_relative("home/page.tsx", &options).unwrap();
        let plain = PageEntry::from_relative("home/index.tsx", &options).unwrap();

        assert!(index.is_index);
        assert_eq!(index.route_key(), "/home");
        assert!(!plain.is_index);
        assert_eq!(plain.route_key(), "/home/index");
    }

    #[test]
    fn test_from_relative_rejects_other_extensions() {
        assert!(PageEntry::from_relative("home.css", &options()).is_none());
        assert!(PageEntry::from_relative("home/readme.md", &options()).is_none());
    }

    #[test]
    fn test_params() {
        let page = entry("orgs/[org]/repos/[repo].tsx");
        let params: Vec<_> = page.params().collect();
        assert_eq!(params, vec!["org", "repo"]);
    }

    #[test]
    fn test_relative_page_path() {
        let page_dir = Path::new("/app/src/pages");
        assert_eq!(
            relative_page_path(Path::new("/app/src/pages/home/settings.tsx"), page_dir),
            Some("home/settings.tsx".to_owned())
        );
        assert_eq!(relative_page_path(Path::new("/app/src/other.tsx"), page_dir), None);
        assert_eq!(relative_page_path(page_dir, page_dir), None);
        assert_eq!(
            page_file_path(page_dir, "users/[id].tsx"),
            PathBuf::from("/app/src/pages/users/[id].tsx")
        );
    }

    #[test]
    fn test_page_map_orders_by_relative_path() {
        let map: PageMap = ["b.tsx", "a/index.tsx", "a.tsx"]
            .into_iter()
            .map(entry)
            .collect();

        let paths: Vec<_> = map.iter().map(|p| p.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["a.tsx", "a/index.tsx", "b.tsx"]);
        assert_eq!(map.len(), 3);
        assert!(map.get("b.tsx").is_some());
    }
}
