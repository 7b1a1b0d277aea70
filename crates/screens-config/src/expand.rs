//! Environment variable expansion for configuration strings.
//!
//! Supports:
//! - `${VAR}` or `$VAR` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use std::cell::RefCell;
use std::convert::Infallible;

use crate::ConfigError;

/// Expand environment variable references in a string.
///
/// Returns the original string unchanged if no `$` is present.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains('$') {
        return Ok(value.to_owned());
    }

    // Unset variables are reported as `None` so `:-` defaults still apply;
    // a `${VAR}` or `$VAR` left in the output afterwards had no default.
    let unset = RefCell::new(Vec::new());
    let expanded = shellexpand::env_with_context(value, |var| -> Result<Option<String>, Infallible> {
        let found = std::env::var(var).ok();
        if found.is_none() {
            unset.borrow_mut().push(var.to_owned());
        }
        Ok(found)
    })
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} could not be expanded", e.var_name),
    })?
    .into_owned();

    if let Some(var) = unset
        .into_inner()
        .into_iter()
        .find(|var| is_left_unexpanded(&expanded, var))
    {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{var}}} not set"),
        });
    }

    Ok(expanded)
}

/// True if `var` still appears as `${var}` or as a bare `$var` reference.
fn is_left_unexpanded(expanded: &str, var: &str) -> bool {
    if expanded.contains(&format!("${{{var}}}")) {
        return true;
    }
    let bare = format!("${var}");
    expanded.match_indices(&bare).any(|(at, _)| {
        !expanded[at + bare.len()..]
            .starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("SCREENS_TEST_SIMPLE", "app");
        }
        let result = expand_env("${SCREENS_TEST_SIMPLE}/pages", "page_dir").unwrap();
        assert_eq!(result, "app/pages");
        unsafe {
            std::env::remove_var("SCREENS_TEST_SIMPLE");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("SCREENS_TEST_UNSET");
        }
        let result = expand_env("${SCREENS_TEST_UNSET:-src}/pages", "page_dir").unwrap();
        assert_eq!(result, "src/pages");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("SCREENS_TEST_MISSING");
        }
        let err = expand_env("${SCREENS_TEST_MISSING}/pages", "page_dir").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("SCREENS_TEST_MISSING"));
        assert!(err.to_string().contains("page_dir"));
    }

    #[test]
    fn test_expand_missing_bare_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("SCREENS_TEST_BARE_MISSING");
        }
        let err = expand_env("$SCREENS_TEST_BARE_MISSING/pages", "page_dir").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("SCREENS_TEST_BARE_MISSING"));
    }

    #[test]
    fn test_expand_bare_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("SCREENS_TEST_BARE", "web");
        }
        let result = expand_env("$SCREENS_TEST_BARE/pages", "page_dir").unwrap();
        assert_eq!(result, "web/pages");
        unsafe {
            std::env::remove_var("SCREENS_TEST_BARE");
        }
    }

    #[test]
    fn test_is_left_unexpanded_matches_whole_names() {
        assert!(is_left_unexpanded("$HOME_DIR/pages", "HOME_DIR"));
        assert!(is_left_unexpanded("src/${HOME_DIR}", "HOME_DIR"));
        assert!(!is_left_unexpanded("$HOME_DIRS/pages", "HOME_DIR"));
        assert!(!is_left_unexpanded("src/pages", "HOME_DIR"));
    }

    #[test]
    fn test_expand_literal_unchanged() {
        let result = expand_env("src/pages", "page_dir").unwrap();
        assert_eq!(result, "src/pages");
    }
}
