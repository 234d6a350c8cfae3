//! Adaptor and loader interfaces.
//!
//! Responsibilities:
//! - Define the factory/teardown seam between a wiring node and the
//!   runtime that actually loads code and resources.
//! - Keep the loader opaque: the node caches it, hands it back at
//!   invalidation time, and otherwise only forwards resource queries.

use std::sync::Arc;

use crate::error::WiringResult;
use crate::wiring::WiringNode;

/// Options for entry and resource searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Descend into subdirectories of the search path.
    pub recurse: bool,
    /// Restrict the search to the module's own content, ignoring wired
    /// providers.
    pub local_only: bool,
}

impl SearchOptions {
    pub fn recursive() -> Self {
        Self {
            recurse: true,
            local_only: false,
        }
    }

    pub fn local() -> Self {
        Self {
            recurse: false,
            local_only: true,
        }
    }
}

/// The per-node class/resource loading domain.
///
/// Created at most once per wiring node, owned by that node, and logically
/// dead the instant the node is invalidated.
pub trait Loader: Send + Sync {
    /// List entry paths under `path` matching `pattern` (all entries when
    /// `None`).
    fn find_entries(&self, path: &str, pattern: Option<&str>, options: SearchOptions)
        -> Vec<String>;

    /// List resource names visible through this wiring under `path`.
    fn list_resources(
        &self,
        path: &str,
        pattern: Option<&str>,
        options: SearchOptions,
    ) -> Vec<String>;
}

/// Runtime hooks a wiring node calls at the edges of its lifecycle.
pub trait WiringAdaptor: Send + Sync {
    /// Construct the loader for `wiring`. Called at most once per node
    /// unless construction fails; failures propagate to the caller that
    /// triggered creation and are never cached.
    ///
    /// Runs while the node's loader slot is locked: implementations must
    /// not call back into `wiring.loader()`.
    fn create_loader(&self, wiring: &Arc<WiringNode>) -> WiringResult<Arc<dyn Loader>>;

    /// Called exactly once, after `wiring` has marked itself invalid, with
    /// whatever loader existed at that point. Runs outside the node's
    /// lock; teardown may re-enter the runtime.
    fn invalidate_wiring(&self, wiring: &WiringNode, loader: Option<Arc<dyn Loader>>);
}
