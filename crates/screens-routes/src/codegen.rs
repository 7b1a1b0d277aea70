//! Route module source generation.
//!
//! Produces an ES module exporting React Router style route objects:
//!
//! ```js
//! import React from "react";
//! import Page0 from "/app/src/pages/home.tsx";
//!
//! export const routes = [
//!   {
//!     path: "/home",
//!     element: React.createElement(Page0),
//!   },
//! ];
//!
//! export default routes;
//! ```
//!
//! In lazy mode pages are imported with `React.lazy` and every element is
//! wrapped in `React.Suspense`. Output is a pure function of the tree and
//! the options.

use std::fmt::Write;
use std::path::Path;

use screens_config::{ImportMode, ResolvedOptions};

use crate::tree::{NodeSegment, RouteNode};

/// Malformed route tree reached the generator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid route tree at {route_key}: {message}")]
pub struct GenerationError {
    /// Route key of the offending node.
    pub route_key: String,
    /// What is wrong with it.
    pub message: String,
}

impl GenerationError {
    fn new(node: &RouteNode, message: &str) -> Self {
        Self {
            route_key: node.route_key.clone(),
            message: message.to_owned(),
        }
    }
}

/// Generate the routes module source for a tree.
///
/// # Errors
///
/// Returns [`GenerationError`] if a node has neither a component nor
/// children, or if an index node has children.
pub fn generate(routes: &[RouteNode], options: &ResolvedOptions) -> Result<String, GenerationError> {
    let mut imports: Vec<String> = Vec::new();
    let mut body = String::new();

    body.push_str("export const routes = [\n");
    for node in routes {
        write_route(&mut body, node, true, 1, options, &mut imports)?;
    }
    body.push_str("];\n\nexport default routes;\n");

    let mut source = String::with_capacity(body.len() + imports.len() * 64 + 32);
    source.push_str("import React from \"react\";\n");
    for (i, specifier) in imports.iter().enumerate() {
        let specifier = js_string(specifier);
        if options.lazy {
            let _ = writeln!(source, "const Page{i} = React.lazy(() => import({specifier}));");
        } else {
            let _ = writeln!(source, "import Page{i} from {specifier};");
        }
    }
    source.push('\n');
    source.push_str(&body);
    Ok(source)
}

/// Write one route object and its children.
fn write_route(
    out: &mut String,
    node: &RouteNode,
    is_root: bool,
    depth: usize,
    options: &ResolvedOptions,
    imports: &mut Vec<String>,
) -> Result<(), GenerationError> {
    if node.component.is_none() && node.children.is_empty() {
        return Err(GenerationError::new(node, "route has no component and no children"));
    }
    if node.is_index() && !node.children.is_empty() {
        return Err(GenerationError::new(node, "index route cannot have children"));
    }

    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{indent}{{");

    match &node.segment {
        NodeSegment::Index => {
            let _ = writeln!(out, "{indent}  index: true,");
        }
        segment => {
            let path = if is_root {
                format!("/{segment}")
            } else {
                segment.to_string()
            };
            let _ = writeln!(out, "{indent}  path: {},", js_string(&path));
        }
    }

    if let Some(component) = &node.component {
        let name = format!("Page{}", imports.len());
        imports.push(import_specifier(component, options));
        let element = if options.lazy {
            format!("React.createElement(React.Suspense, null, React.createElement({name}))")
        } else {
            format!("React.createElement({name})")
        };
        let _ = writeln!(out, "{indent}  element: {element},");
    }

    if !node.children.is_empty() {
        let _ = writeln!(out, "{indent}  children: [");
        for child in &node.children {
            write_route(out, child, false, depth + 2, options, imports)?;
        }
        let _ = writeln!(out, "{indent}  ],");
    }

    let _ = writeln!(out, "{indent}}},");
    Ok(())
}

/// Module specifier for a page file.
///
/// `Root` mode yields `/src/pages/home.tsx` style specifiers for files under
/// the project root and falls back to the absolute path otherwise.
fn import_specifier(file: &Path, options: &ResolvedOptions) -> String {
    let path = match options.import_mode {
        ImportMode::Root => file
            .strip_prefix(&options.root)
            .map_or_else(|_| file.to_path_buf(), |rel| Path::new("/").join(rel)),
        ImportMode::Absolute => file.to_path_buf(),
    };
    let specifier = path.to_string_lossy();
    if cfg!(windows) {
        specifier.replace('\\', "/")
    } else {
        specifier.into_owned()
    }
}

/// Quote a string as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}
