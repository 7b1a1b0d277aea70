//! Page discovery by filesystem walking.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use screens_config::ResolvedOptions;

use crate::error::ScanError;
use crate::page::{PageEntry, PageMap, relative_page_path};

/// Scan the page directory and return every routable file.
///
/// A file is included iff its name ends with `.` followed by a configured
/// extension. Hidden entries (leading `.`) are skipped. Symlinks are
/// followed; a link back to one of its own ancestors is skipped. Returns an
/// empty map if the page directory doesn't exist.
///
/// # Errors
///
/// Returns [`ScanError::Io`] if a directory cannot be read for any reason
/// other than not existing.
pub fn scan(options: &ResolvedOptions) -> Result<PageMap, ScanError> {
    let mut pages = PageMap::new();
    let mut ancestors = HashSet::new();
    scan_directory(&options.page_dir, "", options, &mut ancestors, &mut pages)?;
    tracing::debug!(
        page_dir = %options.page_dir.display(),
        page_count = pages.len(),
        "Page scan completed"
    );
    Ok(pages)
}

/// Scan one directory below the page directory.
///
/// Used to expand a directory that appeared in one piece (moved in) into its
/// pages. Returns an empty map if `dir` is not inside the page directory.
pub(crate) fn scan_subtree(dir: &Path, options: &ResolvedOptions) -> Result<PageMap, ScanError> {
    let mut pages = PageMap::new();
    if let Some(prefix) = relative_page_path(dir, &options.page_dir) {
        let mut ancestors = HashSet::new();
        scan_directory(dir, &prefix, options, &mut ancestors, &mut pages)?;
    }
    Ok(pages)
}

/// Scan a directory and collect page entries, recursing into subdirectories.
///
/// `ancestors` holds the canonical paths of the directories being walked, so
/// a symlink cycle is detected instead of followed.
fn scan_directory(
    dir_path: &Path,
    prefix: &str,
    options: &ResolvedOptions,
    ancestors: &mut HashSet<PathBuf>,
    pages: &mut PageMap,
) -> Result<(), ScanError> {
    let canonical = match fs::canonicalize(dir_path) {
        Ok(canonical) => canonical,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(ScanError::io(e, dir_path)),
    };
    if !ancestors.insert(canonical.clone()) {
        tracing::warn!(path = %dir_path.display(), "Skipping symlink cycle");
        return Ok(());
    }
    let result = read_directory(dir_path, prefix, options, ancestors, pages);
    ancestors.remove(&canonical);
    result
}

fn read_directory(
    dir_path: &Path,
    prefix: &str,
    options: &ResolvedOptions,
    ancestors: &mut HashSet<PathBuf>,
    pages: &mut PageMap,
) -> Result<(), ScanError> {
    let entries = match fs::read_dir(dir_path) {
        Ok(entries) => entries,
        // Removed while we were walking, or not created yet
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(ScanError::io(e, dir_path)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| ScanError::io(e, dir_path))?;
        let path = entry.path();

        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            tracing::warn!(path = %path.display(), "Skipping non-UTF-8 file name");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        let file_type = entry.file_type().map_err(|e| ScanError::io(e, &path))?;
        let is_dir = if file_type.is_symlink() {
            match fs::metadata(&path) {
                Ok(target) => target.is_dir(),
                // Dangling link
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(ScanError::io(e, &path)),
            }
        } else {
            file_type.is_dir()
        };
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        if is_dir {
            scan_directory(&path, &relative, options, ancestors, pages)?;
        } else if let Some(page) = PageEntry::from_relative(&relative, options) {
            pages.insert(page);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;

    fn setup() -> (tempfile::TempDir, ResolvedOptions) {
        let temp = tempfile::tempdir().unwrap();
        let page_dir = temp.path().canonicalize().unwrap();
        (temp, ResolvedOptions::for_dir(page_dir))
    }

    fn touch(options: &ResolvedOptions, relative: &str) {
        let path = options.page_dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "export default function Page() {}").unwrap();
    }

    fn keys(pages: &PageMap) -> Vec<&str> {
        pages.iter().map(|p| p.relative_path.as_str()).collect()
    }

    #[test]
    fn test_scan_empty_dir() {
        let (_temp, options) = setup();

        let pages = scan(&options).unwrap();

        assert!(pages.is_empty());
    }

    #[test]
    fn test_scan_missing_dir() {
        let options = ResolvedOptions::for_dir(PathBuf::from("/nonexistent/src/pages"));

        let pages = scan(&options).unwrap();

        assert!(pages.is_empty());
    }

    #[test]
    fn test_scan_finds_nested_pages() {
        let (_temp, options) = setup();
        touch(&options, "index.tsx");
        touch(&options, "home.tsx");
        touch(&options, "home/settings.tsx");
        touch(&options, "users/[id].jsx");

        let pages = scan(&options).unwrap();

        assert_eq!(
            keys(&pages),
            vec!["home.tsx", "home/settings.tsx", "index.tsx", "users/[id].jsx"]
        );
        let settings = pages.get("home/settings.tsx").unwrap();
        assert_eq!(settings.file_path, options.page_dir.join("home/settings.tsx"));
        assert_eq!(settings.route_key(), "/home/settings");
    }

    #[test]
    fn test_scan_filters_by_extension() {
        let (_temp, mut options) = setup();
        options.extensions = vec!["vue".to_owned()];
        touch(&options, "home.vue");
        touch(&options, "home.tsx");
        touch(&options, "styles.css");

        let pages = scan(&options).unwrap();

        assert_eq!(keys(&pages), vec!["home.vue"]);
    }

    #[test]
    fn test_scan_skips_hidden_entries() {
        let (_temp, options) = setup();
        touch(&options, ".draft.tsx");
        touch(&options, ".cache/page.tsx");
        touch(&options, "visible.tsx");

        let pages = scan(&options).unwrap();

        assert_eq!(keys(&pages), vec!["visible.tsx"]);
    }

    #[test]
    fn test_scan_ignores_directories_named_like_pages() {
        let (_temp, options) = setup();
        fs::create_dir_all(options.page_dir.join("about.tsx")).unwrap();

        let pages = scan(&options).unwrap();

        assert!(pages.is_empty());
    }

    #[test]
    fn test_scan_is_deterministic() {
        let (_temp, options) = setup();
        touch(&options, "b.tsx");
        touch(&options, "a/index.tsx");
        touch(&options, "a/[slug].tsx");
        touch(&options, "c/d/e.ts");

        let first = scan(&options).unwrap();
        let second = scan(&options).unwrap();

        assert_eq!(first, second);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_follows_symlinked_directory() {
        let (_temp, options) = setup();
        let shared = tempfile::tempdir().unwrap();
        fs::write(shared.path().join("list.tsx"), "").unwrap();
        std::os::unix::fs::symlink(shared.path(), options.page_dir.join("shared")).unwrap();
        touch(&options, "home.tsx");

        let pages = scan(&options).unwrap();

        assert_eq!(keys(&pages), vec!["home.tsx", "shared/list.tsx"]);
        assert_eq!(
            pages.get("shared/list.tsx").unwrap().file_path,
            options.page_dir.join("shared/list.tsx")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_skips_symlink_cycle_and_dangling_link() {
        let (_temp, options) = setup();
        touch(&options, "docs/intro.tsx");
        std::os::unix::fs::symlink(&options.page_dir, options.page_dir.join("docs/loop")).unwrap();
        std::os::unix::fs::symlink(
            options.page_dir.join("missing"),
            options.page_dir.join("gone.tsx"),
        )
        .unwrap();

        let pages = scan(&options).unwrap();

        assert_eq!(keys(&pages), vec!["docs/intro.tsx"]);
    }

    #[test]
    fn test_scan_subtree_keeps_page_dir_relative_paths() {
        let (_temp, options) = setup();
        touch(&options, "home.tsx");
        touch(&options, "users/[id].tsx");
        touch(&options, "users/admin/index.tsx");

        let pages = scan_subtree(&options.page_dir.join("users"), &options).unwrap();

        assert_eq!(keys(&pages), vec!["users/[id].tsx", "users/admin/index.tsx"]);
        assert_eq!(pages.get("users/[id].tsx").unwrap().route_key(), "/users/:id");
    }

    #[test]
    fn test_scan_subtree_outside_page_dir_is_empty() {
        let (_temp, options) = setup();
        let other = tempfile::tempdir().unwrap();
        fs::write(other.path().join("home.tsx"), "").unwrap();

        let pages = scan_subtree(other.path(), &options).unwrap();

        assert!(pages.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_unreadable_dir_is_error() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, options) = setup();
        touch(&options, "admin/panel.tsx");
        let admin = options.page_dir.join("admin");
        fs::set_permissions(&admin, fs::Permissions::from_mode(0o000)).unwrap();

        let result = scan(&options);

        fs::set_permissions(&admin, fs::Permissions::from_mode(0o755)).unwrap();
        // Privileged users can read the directory regardless of mode bits
        if fs::read_dir(&admin).is_ok() && result.is_ok() {
            return;
        }
        let err = result.unwrap_err();
        assert_eq!(err.path(), admin);
    }
}
