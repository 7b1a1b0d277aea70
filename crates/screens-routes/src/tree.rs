//! Route tree construction from scanned pages.
//!
//! Pages are grouped by their segment prefixes. Every distinct segment at a
//! directory level becomes one [`RouteNode`]:
//!
//! - `home.tsx` sets the component of the `home` node
//! - `home/settings.tsx` becomes a child of the `home` node
//! - `home/index.tsx` becomes an [`NodeSegment::Index`] child of the `home` node
//! - `index.tsx` at the top level becomes a root `Index` node
//!
//! Siblings are ordered index first, then static, dynamic and catch-all
//! segments, each group by name. Static routes therefore take precedence in
//! matching order.

use std::collections::BTreeMap;
use std::collections::hash_map::{Entry, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use screens_config::ResolvedOptions;
use screens_pages::{PageEntry, PageMap, RouteSegment, route_key};
use serde::Serialize;

/// Segment of a route node.
///
/// Variant order is the sibling order of the generated tree.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum NodeSegment {
    /// Index route of the parent directory.
    Index,
    /// Literal path component.
    Static(String),
    /// Parameter capturing one path component.
    Dynamic(String),
    /// Parameter capturing the rest of the path.
    CatchAll(String),
}

impl NodeSegment {
    /// Parameter name, if the segment captures one.
    #[must_use]
    pub fn param(&self) -> Option<&str> {
        match self {
            Self::Index | Self::Static(_) => None,
            Self::Dynamic(name) | Self::CatchAll(name) => Some(name),
        }
    }
}

impl From<&RouteSegment> for NodeSegment {
    fn from(segment: &RouteSegment) -> Self {
        match segment {
            RouteSegment::Static(name) => Self::Static(name.clone()),
            RouteSegment::Dynamic(name) => Self::Dynamic(name.clone()),
            RouteSegment::CatchAll(name) => Self::CatchAll(name.clone()),
        }
    }
}

impl fmt::Display for NodeSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index => Ok(()),
            Self::Static(name) => f.write_str(name),
            Self::Dynamic(name) => write!(f, ":{name}"),
            Self::CatchAll(_) => f.write_str("*"),
        }
    }
}

/// One node of the route tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteNode {
    /// Path segment relative to the parent node.
    pub segment: NodeSegment,
    /// Full route key (e.g., "/users/:id"). Index nodes share their parent's key.
    pub route_key: String,
    /// Page source file rendered for this route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<PathBuf>,
    /// Nested routes in sibling order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    /// True if this is an index route.
    #[must_use]
    pub fn is_index(&self) -> bool {
        self.segment == NodeSegment::Index
    }

    /// Parameter name captured by this node's segment.
    #[must_use]
    pub fn param(&self) -> Option<&str> {
        self.segment.param()
    }

    /// Depth-first search for the node with the given route key.
    ///
    /// A directory node and its index child share a key; the directory node is
    /// found first.
    #[must_use]
    pub fn find<'a>(routes: &'a [RouteNode], route_key: &str) -> Option<&'a RouteNode> {
        routes.iter().find_map(|node| {
            if node.route_key == route_key {
                Some(node)
            } else {
                Self::find(&node.children, route_key)
            }
        })
    }
}

/// Two pages resolve to the same route.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Route collision at {route_key}: {} and {} resolve to the same route",
    first.display(),
    second.display()
)]
pub struct CollisionError {
    /// Route key both files map to.
    pub route_key: String,
    /// First offending file (in path order).
    pub first: PathBuf,
    /// Second offending file (in path order).
    pub second: PathBuf,
}

impl CollisionError {
    fn new(route_key: String, a: &Path, b: &Path) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            route_key,
            first: first.to_path_buf(),
            second: second.to_path_buf(),
        }
    }
}

/// Intermediate directory level used while grouping pages.
#[derive(Default)]
struct DirNode<'a> {
    /// Page named after this directory (`about.tsx` for `about/`).
    element: Option<&'a PageEntry>,
    /// Index page inside this directory.
    index: Option<&'a PageEntry>,
    children: BTreeMap<RouteSegment, DirNode<'a>>,
}

/// Build the route tree from scanned pages.
///
/// Returns root nodes in sibling order.
///
/// # Errors
///
/// Returns [`CollisionError`] if two pages resolve to the same route key,
/// e.g. `about.tsx` and `about/index.tsx`, `about.tsx` and `about.jsx`, or
/// `[id].tsx` and `:id.tsx`.
pub fn build_tree(
    pages: &PageMap,
    options: &ResolvedOptions,
) -> Result<Vec<RouteNode>, CollisionError> {
    let mut root = DirNode::default();
    // Rendered key of every segment prefix, with the segments and the first
    // page that produced it
    let mut claimed: HashMap<String, (&[RouteSegment], &PageEntry)> = HashMap::new();

    for page in pages {
        for depth in 1..=page.segments.len() {
            let prefix = &page.segments[..depth];
            match claimed.entry(route_key(prefix)) {
                Entry::Vacant(entry) => {
                    entry.insert((prefix, page));
                }
                Entry::Occupied(entry) => {
                    let (segments, owner) = *entry.get();
                    if segments != prefix {
                        return Err(CollisionError::new(
                            entry.key().clone(),
                            &owner.file_path,
                            &page.file_path,
                        ));
                    }
                }
            }
        }

        let node = page
            .segments
            .iter()
            .fold(&mut root, |node, segment| {
                node.children.entry(segment.clone()).or_default()
            });

        let (slot, other) = if page.is_index {
            (&mut node.index, node.element)
        } else {
            (&mut node.element, node.index)
        };
        if let Some(existing) = (*slot).or(other) {
            return Err(CollisionError::new(
                page.route_key(),
                &existing.file_path,
                &page.file_path,
            ));
        }
        *slot = Some(page);
    }

    let routes = child_routes(root.index, root.children, "/");
    tracing::debug!(
        page_dir = %options.page_dir.display(),
        page_count = pages.len(),
        root_count = routes.len(),
        "Route tree built"
    );
    Ok(routes)
}

/// Convert a directory level into its child route nodes.
fn child_routes(
    index: Option<&PageEntry>,
    children: BTreeMap<RouteSegment, DirNode<'_>>,
    route_key: &str,
) -> Vec<RouteNode> {
    let mut routes = Vec::with_capacity(children.len() + 1);

    if let Some(index) = index {
        routes.push(RouteNode {
            segment: NodeSegment::Index,
            route_key: route_key.to_owned(),
            component: Some(index.file_path.clone()),
            children: Vec::new(),
        });
    }

    // BTreeMap order over RouteSegment is static, dynamic, catch-all by name
    for (segment, dir) in children {
        let child_key = if route_key == "/" {
            format!("/{segment}")
        } else {
            format!("{route_key}/{segment}")
        };
        routes.push(RouteNode {
            segment: NodeSegment::from(&segment),
            component: dir.element.map(|page| page.file_path.clone()),
            children: child_routes(dir.index, dir.children, &child_key),
            route_key: child_key,
        });
    }

    routes
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn options() -> ResolvedOptions {
        ResolvedOptions::for_dir("/app/src/pages")
    }

    fn pages(paths: &[&str]) -> PageMap {
        let options = options();
        paths
            .iter()
            .map(|p| PageEntry::from_relative(p, &options).unwrap())
            .collect()
    }

    fn build(paths: &[&str]) -> Vec<RouteNode> {
        build_tree(&pages(paths), &options()).unwrap()
    }

    fn file(relative: &str) -> Option<PathBuf> {
        Some(PathBuf::from("/app/src/pages").join(relative))
    }

    fn segments(routes: &[RouteNode]) -> Vec<String> {
        routes.iter().map(|r| format!("{:?}", r.segment)).collect()
    }

    #[test]
    fn test_build_tree_empty() {
        assert!(build(&[]).is_empty());
    }

    #[test]
    fn test_build_tree_single_page() {
        let routes = build(&["home.tsx"]);

        assert_eq!(
            routes,
            vec![RouteNode {
                segment: NodeSegment::Static("home".to_owned()),
                route_key: "/home".to_owned(),
                component: file("home.tsx"),
                children: Vec::new(),
            }]
        );
    }

    #[test]
    fn test_build_tree_nests_directory_under_same_named_file() {
        let routes = build(&["home.tsx", "home/settings.tsx"]);

        assert_eq!(routes.len(), 1);
        let home = &routes[0];
        assert_eq!(home.route_key, "/home");
        assert_eq!(home.component, file("home.tsx"));
        assert_eq!(home.children.len(), 1);
        let settings = &home.children[0];
        assert_eq!(settings.segment, NodeSegment::Static("settings".to_owned()));
        assert_eq!(settings.route_key, "/home/settings");
        assert_eq!(settings.component, file("home/settings.tsx"));
    }

    #[test]
    fn test_build_tree_root_index() {
        let routes = build(&["index.tsx", "about.tsx"]);

        assert_eq!(routes.len(), 2);
        assert!(routes[0].is_index());
        assert_eq!(routes[0].route_key, "/");
        assert_eq!(routes[0].component, file("index.tsx"));
        assert_eq!(routes[1].route_key, "/about");
    }

    #[test]
    fn test_build_tree_directory_index_becomes_index_child() {
        let routes = build(&["users/index.tsx", "users/new.tsx"]);

        let users = &routes[0];
        assert_eq!(users.component, None);
        assert_eq!(
            segments(&users.children),
            vec!["Index", "Static(\"new\")"]
        );
        assert_eq!(users.children[0].route_key, "/users");
        assert_eq!(users.children[0].component, file("users/index.tsx"));
    }

    #[test]
    fn test_build_tree_intermediate_directory_without_page() {
        let routes = build(&["users/[id]/edit.tsx"]);

        let users = &routes[0];
        assert_eq!(users.component, None);
        let id = &users.children[0];
        assert_eq!(id.segment, NodeSegment::Dynamic("id".to_owned()));
        assert_eq!(id.param(), Some("id"));
        assert_eq!(id.component, None);
        assert_eq!(id.children[0].route_key, "/users/:id/edit");
    }

    #[test]
    fn test_build_tree_dynamic_after_static() {
        let routes = build(&[
            "blog/[slug].tsx",
            "blog/archive.tsx",
            "blog/[...rest].tsx",
            "blog/index.tsx",
            "blog/about.tsx",
        ]);

        let blog = &routes[0];
        assert_eq!(
            segments(&blog.children),
            vec![
                "Index",
                "Static(\"about\")",
                "Static(\"archive\")",
                "Dynamic(\"slug\")",
                "CatchAll(\"rest\")",
            ]
        );
        assert_eq!(blog.children[3].param(), Some("slug"));
        assert_eq!(blog.children[3].route_key, "/blog/:slug");
        assert_eq!(blog.children[4].route_key, "/blog/*");
    }

    #[test]
    fn test_build_tree_distinct_dynamic_siblings_ordered_by_name() {
        let routes = build(&["[slug].tsx", "[id].tsx", "z.tsx"]);

        assert_eq!(
            segments(&routes),
            vec!["Static(\"z\")", "Dynamic(\"id\")", "Dynamic(\"slug\")"]
        );
    }

    #[test]
    fn test_build_tree_index_and_file_collide() {
        let err = build_tree(&pages(&["a/index.tsx", "a.tsx"]), &options()).unwrap_err();

        assert_eq!(
            err,
            CollisionError {
                route_key: "/a".to_owned(),
                first: PathBuf::from("/app/src/pages/a/index.tsx"),
                second: PathBuf::from("/app/src/pages/a.tsx"),
            }
        );
        assert_eq!(
            err.to_string(),
            "Route collision at /a: /app/src/pages/a/index.tsx and /app/src/pages/a.tsx \
             resolve to the same route"
        );
    }

    #[test]
    fn test_build_tree_same_stem_different_extension_collide() {
        let err = build_tree(&pages(&["about.tsx", "about.jsx"]), &options()).unwrap_err();

        assert_eq!(err.route_key, "/about");
        assert_eq!(err.first, PathBuf::from("/app/src/pages/about.jsx"));
        assert_eq!(err.second, PathBuf::from("/app/src/pages/about.tsx"));
    }

    #[test]
    fn test_build_tree_two_root_indexes_collide() {
        let err = build_tree(&pages(&["index.tsx", "index.js"]), &options()).unwrap_err();

        assert_eq!(err.route_key, "/");
    }

    #[test]
    fn test_build_tree_catch_alls_with_different_names_collide() {
        let err =
            build_tree(&pages(&["docs/[...a].tsx", "docs/[...b].tsx"]), &options()).unwrap_err();

        assert_eq!(
            err,
            CollisionError {
                route_key: "/docs/*".to_owned(),
                first: PathBuf::from("/app/src/pages/docs/[...a].tsx"),
                second: PathBuf::from("/app/src/pages/docs/[...b].tsx"),
            }
        );
    }

    #[test]
    fn test_build_tree_static_name_rendering_as_param_collides() {
        let err = build_tree(&pages(&["[id].tsx", ":id.tsx"]), &options()).unwrap_err();

        assert_eq!(err.route_key, "/:id");
        assert_eq!(err.first, PathBuf::from("/app/src/pages/:id.tsx"));
        assert_eq!(err.second, PathBuf::from("/app/src/pages/[id].tsx"));
    }

    #[test]
    fn test_build_tree_colliding_directories_collide() {
        let err = build_tree(
            &pages(&["docs/[...a]/intro.tsx", "docs/[...b]/setup.tsx"]),
            &options(),
        )
        .unwrap_err();

        assert_eq!(err.route_key, "/docs/*");
        assert_eq!(err.first, PathBuf::from("/app/src/pages/docs/[...a]/intro.tsx"));
        assert_eq!(err.second, PathBuf::from("/app/src/pages/docs/[...b]/setup.tsx"));
    }

    #[test]
    fn test_build_tree_sibling_keys_are_unique() {
        fn check(routes: &[RouteNode]) {
            let mut keys: Vec<_> = routes
                .iter()
                .filter(|r| !r.is_index())
                .map(|r| r.route_key.as_str())
                .collect();
            let count = keys.len();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), count);
            for route in routes {
                check(&route.children);
            }
        }

        let routes = build(&["a.tsx", "a/[x].tsx", "a/[y].tsx", "a/b.tsx", "[...all].tsx"]);

        check(&routes);
    }

    #[test]
    fn test_build_tree_index_directory_is_not_root() {
        let routes = build(&["index.tsx", "index/index.tsx"]);

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].route_key, "/");
        assert_eq!(routes[1].route_key, "/index");
        assert!(routes[1].children[0].is_index());
    }

    #[test]
    fn test_build_tree_is_deterministic() {
        let input = pages(&["b.tsx", "a/[id].tsx", "a/index.tsx", "index.tsx", "c/d/e.tsx"]);

        let first = build_tree(&input, &options()).unwrap();
        let second = build_tree(&input, &options()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_find() {
        let routes = build(&["users.tsx", "users/new.tsx", "users/[id].tsx"]);

        let users = RouteNode::find(&routes, "/users").unwrap();
        assert_eq!(users.component, file("users.tsx"));
        assert!(RouteNode::find(&routes, "/users/:id").is_some());
        assert!(RouteNode::find(&routes, "/missing").is_none());
    }

    #[test]
    fn test_route_node_serializes_to_json() {
        let routes = build(&["users/[id].tsx"]);

        let json = serde_json::to_value(&routes).unwrap();

        assert_eq!(
            json,
            serde_json::json!([{
                "segment": { "kind": "static", "name": "users" },
                "route_key": "/users",
                "children": [{
                    "segment": { "kind": "dynamic", "name": "id" },
                    "route_key": "/users/:id",
                    "component": "/app/src/pages/users/[id].tsx",
                }],
            }])
        );
    }
}
