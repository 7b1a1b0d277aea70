//! Error type for route module requests.

use screens_pages::ScanError;

use crate::codegen::GenerationError;
use crate::tree::CollisionError;

/// Error returned by [`RouteContext::request`](crate::RouteContext::request).
///
/// The cache is left untouched on any of these.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// Page directory could not be scanned.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// Two pages resolve to the same route.
    #[error(transparent)]
    Collision(#[from] CollisionError),
    /// Route tree violated a generator invariant.
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_route_error_display_is_transparent() {
        let err = RouteError::from(CollisionError {
            route_key: "/a".to_owned(),
            first: PathBuf::from("/p/a.jsx"),
            second: PathBuf::from("/p/a.tsx"),
        });

        assert_eq!(
            err.to_string(),
            "Route collision at /a: /p/a.jsx and /p/a.tsx resolve to the same route"
        );
    }

    #[test]
    fn test_route_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RouteError>();
    }
}
