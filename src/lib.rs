// Modwire Library
// Wiring state for a dynamic module runtime: what each resolved module
// revision provides, what it requires, and how it is wired to its peers
// while the module graph is re-resolved, refreshed, or torn down live.

pub mod adaptor;
pub mod error;
pub mod revision;
pub mod security;
pub mod wiring;

pub use adaptor::{Loader, SearchOptions, WiringAdaptor};
pub use error::{WiringError, WiringResult};
pub use revision::Revision;
pub use security::{AllowAll, ResourcePolicy, ScopedPolicy};
pub use wiring::{
    Capability, Requirement, Wire, WiringBuilder, WiringNode, HOST_NAMESPACE, PACKAGE_NAMESPACE,
    PACKAGE_NAME_ATTR,
};
