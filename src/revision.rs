//! Revision collaborator trait.
//!
//! A revision is the immutable description of one version of a module,
//! owned by the surrounding runtime. The wiring node holds a non-owning
//! back-reference to it and delegates identity and currency queries.

/// One version of a module, as seen by its wiring node.
///
/// Implementations must be `Send + Sync`; wiring nodes are read from many
/// threads behind `Arc`s.
pub trait Revision: Send + Sync {
    /// Stable identifier of the module this revision belongs to.
    fn module_id(&self) -> &str;

    /// Whether this revision is the module's current revision. A revision
    /// stops being current when the module is updated or uninstalled, even
    /// while older wiring is still referenced.
    fn is_current(&self) -> bool;

    /// Whether this revision is a fragment, attaching to a host revision
    /// rather than standing alone.
    fn is_fragment(&self) -> bool {
        false
    }
}
