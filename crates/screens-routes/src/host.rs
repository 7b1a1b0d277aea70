//! Host build tool boundary.
//!
//! The generated routes module is served as a virtual module. The host owns
//! its cached output; this crate only asks the host to drop it through
//! [`ModuleGraph::invalidate`].

/// Identifier application code imports (`import routes from "virtual:screens"`).
pub const MODULE_ID: &str = "virtual:screens";

/// Resolved identifier of the virtual module.
///
/// The `\0` prefix keeps other plugins from treating it as a file path.
pub const RESOLVED_MODULE_ID: &str = "\0virtual:screens";

/// Host module graph.
pub trait ModuleGraph: Send + Sync {
    /// Drop any cached output for the module with the given resolved id.
    ///
    /// Unknown ids must be ignored.
    fn invalidate(&self, id: &str);
}

/// Module graph that caches nothing.
///
/// Used by the CLI, which regenerates output itself.
pub struct NullModuleGraph;

impl ModuleGraph for NullModuleGraph {
    fn invalidate(&self, _id: &str) {}
}
