//! Wiring state for resolved module revisions.
//!
//! `types` holds the descriptor and wire value types fixed by the
//! resolver; `node` holds the concurrency-safe node that indexes them.

pub mod node;
pub mod types;

pub use node::{WiringBuilder, WiringNode};
pub use types::{
    AttributeMap, Capability, DirectiveMap, Requirement, Wire, HOST_NAMESPACE, PACKAGE_NAMESPACE,
    PACKAGE_NAME_ATTR,
};
