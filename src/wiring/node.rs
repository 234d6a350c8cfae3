//! The wiring node: live record of one resolved module revision.
//!
//! Responsibilities:
//! - Hold the immutable capability/requirement lists and substitution set
//!   fixed by the resolver at construction.
//! - Index provided and required wires as independently swappable
//!   snapshots, so readers never observe a partial replacement.
//! - Drive the one-way valid -> invalid transition and the exactly-once
//!   lazy creation of the node's loader.
//! - Gate the resource query surface behind the configured policy.
//!
//! Many threads read a node concurrently; a single external coordinator
//! (the resolver) performs all mutation and serializes its own calls. The
//! node only guarantees safe reads against writes, not writes against
//! writes.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::adaptor::{Loader, SearchOptions, WiringAdaptor};
use crate::error::{WiringError, WiringResult};
use crate::revision::Revision;
use crate::security::{AllowAll, ResourcePolicy};
use crate::wiring::types::{Capability, Requirement, Wire, HOST_NAMESPACE, PACKAGE_NAMESPACE};

/// Live wiring state of one resolved module revision.
pub struct WiringNode {
    // Self-handle so the loader factory can retain the node. Set once by
    // the builder; upgrades cannot fail while a caller holds the node.
    me: Weak<WiringNode>,
    revision: Weak<dyn Revision>,
    module_id: String,
    capabilities: Vec<Capability>,
    requirements: Vec<Requirement>,
    substituted: HashSet<String>,
    provided: RwLock<Arc<Vec<Wire>>>,
    required: RwLock<Arc<Vec<Wire>>>,
    valid: AtomicBool,
    loader: Mutex<Option<Arc<dyn Loader>>>,
    adaptor: Arc<dyn WiringAdaptor>,
    policy: Arc<dyn ResourcePolicy>,
}

/// Chainable construction of a [`WiringNode`]. All inputs arrive from the
/// resolver; there is no other configuration surface.
pub struct WiringBuilder {
    revision: Weak<dyn Revision>,
    module_id: String,
    adaptor: Arc<dyn WiringAdaptor>,
    policy: Arc<dyn ResourcePolicy>,
    capabilities: Vec<Capability>,
    requirements: Vec<Requirement>,
    provided: Vec<Wire>,
    required: Vec<Wire>,
    substituted: HashSet<String>,
}

impl WiringBuilder {
    pub fn capabilities(mut self, capabilities: Vec<Capability>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn requirements(mut self, requirements: Vec<Requirement>) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn provided_wires(mut self, wires: Vec<Wire>) -> Self {
        self.provided = wires;
        self
    }

    pub fn required_wires(mut self, wires: Vec<Wire>) -> Self {
        self.required = wires;
        self
    }

    pub fn substituted_packages<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.substituted = names.into_iter().map(|n| n.into()).collect();
        self
    }

    pub fn policy(mut self, policy: Arc<dyn ResourcePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn finish(self) -> Arc<WiringNode> {
        Arc::new_cyclic(|me| WiringNode {
            me: me.clone(),
            revision: self.revision,
            module_id: self.module_id,
            capabilities: self.capabilities,
            requirements: self.requirements,
            substituted: self.substituted,
            provided: RwLock::new(Arc::new(self.provided)),
            required: RwLock::new(Arc::new(self.required)),
            valid: AtomicBool::new(true),
            loader: Mutex::new(None),
            adaptor: self.adaptor,
            policy: self.policy,
        })
    }
}

impl WiringNode {
    /// Start building a node for `revision`. The node keeps a non-owning
    /// reference; the revision's own container decides its lifetime.
    pub fn build(revision: &Arc<dyn Revision>, adaptor: Arc<dyn WiringAdaptor>) -> WiringBuilder {
        WiringBuilder {
            module_id: revision.module_id().to_string(),
            revision: Arc::downgrade(revision),
            adaptor,
            policy: Arc::new(AllowAll),
            capabilities: Vec::new(),
            requirements: Vec::new(),
            provided: Vec::new(),
            required: Vec::new(),
            substituted: HashSet::new(),
        }
    }

    /// The revision this node describes, if it is still alive.
    pub fn revision(&self) -> Option<Arc<dyn Revision>> {
        self.revision.upgrade()
    }

    /// Identifier of the module this node was resolved for. Captured at
    /// construction so it survives the revision for diagnostics.
    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Valid AND the revision reports itself current. Strictly stronger
    /// than validity: a node can stay valid solely because another module
    /// still holds a wire to it.
    pub fn is_current(&self) -> bool {
        self.is_valid() && self.revision.upgrade().map_or(false, |r| r.is_current())
    }

    /// Whether the surrounding runtime must keep this node: it is current,
    /// it still provides at least one wire, or it is a fragment attached to
    /// a host. Total even after invalidation.
    pub fn is_in_use(&self) -> bool {
        if self.is_current() {
            return true;
        }
        if !self.provided_snapshot().is_empty() {
            return true;
        }
        self.is_fragment_in_use()
    }

    fn is_fragment_in_use(&self) -> bool {
        let fragment = self.revision.upgrade().map_or(false, |r| r.is_fragment());
        fragment
            && self
                .required_snapshot()
                .iter()
                .any(|w| w.namespace() == HOST_NAMESPACE)
    }

    /// Declared capabilities, in declaration order. `None` returns a copy
    /// of the full list; a namespace returns the matching subsequence.
    pub fn capabilities(&self, namespace: Option<&str>) -> WiringResult<Vec<Capability>> {
        if !self.is_valid() {
            return Err(WiringError::Stale);
        }
        Ok(filter_namespace(&self.capabilities, namespace, |c| {
            c.namespace.as_str()
        }))
    }

    /// Declared requirements, same contract as [`Self::capabilities`].
    pub fn requirements(&self, namespace: Option<&str>) -> WiringResult<Vec<Requirement>> {
        if !self.is_valid() {
            return Err(WiringError::Stale);
        }
        Ok(filter_namespace(&self.requirements, namespace, |r| {
            r.namespace.as_str()
        }))
    }

    /// Wires for which this node is the provider, filtered by the
    /// namespace of each wire's capability end.
    pub fn provided_wires(&self, namespace: Option<&str>) -> WiringResult<Vec<Wire>> {
        if !self.is_valid() {
            return Err(WiringError::Stale);
        }
        let snapshot = self.provided_snapshot();
        Ok(filter_namespace(&snapshot, namespace, |w| w.namespace()))
    }

    /// Wires for which this node is the requirer, same contract as
    /// [`Self::provided_wires`].
    pub fn required_wires(&self, namespace: Option<&str>) -> WiringResult<Vec<Wire>> {
        if !self.is_valid() {
            return Err(WiringError::Stale);
        }
        let snapshot = self.required_snapshot();
        Ok(filter_namespace(&snapshot, namespace, |w| w.namespace()))
    }

    /// Replace the provided-wires snapshot. Resolver-only: the node does
    /// not serialize concurrent writers against each other.
    pub fn set_provided_wires(&self, wires: Vec<Wire>) {
        log::trace!(
            "replacing provided wires for {} ({} wires)",
            self.module_id,
            wires.len()
        );
        *self.provided.write().unwrap() = Arc::new(wires);
    }

    /// Replace the required-wires snapshot. Resolver-only, as above.
    pub fn set_required_wires(&self, wires: Vec<Wire>) {
        log::trace!(
            "replacing required wires for {} ({} wires)",
            self.module_id,
            wires.len()
        );
        *self.required.write().unwrap() = Arc::new(wires);
    }

    /// True iff `capability` is a package capability whose package name is
    /// shadowed by an equivalent import. Capabilities in any other
    /// namespace are never substituted. The capability itself stays listed
    /// by [`Self::capabilities`]; substitution is a query, not a removal.
    pub fn is_substituted(&self, capability: &Capability) -> bool {
        if capability.namespace != PACKAGE_NAMESPACE {
            return false;
        }
        capability
            .package_name()
            .map_or(false, |name| self.substituted.contains(name))
    }

    /// Direct membership query for callers without a capability in hand.
    pub fn is_substituted_package(&self, name: &str) -> bool {
        self.substituted.contains(name)
    }

    /// The substituted package names, sorted for stable output.
    pub fn substituted_packages(&self) -> WiringResult<Vec<String>> {
        if !self.is_valid() {
            return Err(WiringError::Stale);
        }
        let mut names: Vec<String> = self.substituted.iter().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// The node's loader, created on first successful call.
    ///
    /// One mutex section guards the validity flag and the loader slot. The
    /// factory runs while the slot is locked: concurrent first callers
    /// serialize here and all observe the single created instance. A
    /// factory error leaves the slot empty, so a later call retries.
    pub fn loader(&self) -> WiringResult<Arc<dyn Loader>> {
        let mut slot = self.loader.lock().unwrap();
        if !self.valid.load(Ordering::Acquire) {
            return Err(WiringError::Stale);
        }
        if let Some(existing) = slot.as_ref() {
            return Ok(Arc::clone(existing));
        }
        let node = self.me.upgrade().expect("node exists behind an Arc");
        let created = self.adaptor.create_loader(&node)?;
        log::debug!("loader created for {}", self.module_id);
        *slot = Some(Arc::clone(&created));
        Ok(created)
    }

    /// Policy-gated loader access for external callers. Denial yields the
    /// same unavailable signal as an invalidated node and never reaches
    /// the factory.
    pub fn checked_loader(&self) -> WiringResult<Arc<dyn Loader>> {
        if !self.policy.allows_loader_access(&self.module_id) {
            return Err(WiringError::Stale);
        }
        self.loader()
    }

    /// List entry paths through the node's loader. A denying policy
    /// produces an empty answer without touching the loader; an
    /// invalidated node produces `Stale`.
    pub fn find_entries(
        &self,
        path: &str,
        pattern: Option<&str>,
        options: SearchOptions,
    ) -> WiringResult<Vec<String>> {
        if !self.policy.allows_resource_access(&self.module_id) {
            return Ok(Vec::new());
        }
        let loader = self.loader()?;
        Ok(loader.find_entries(path, pattern, options))
    }

    /// List resource names through the node's loader, same gating as
    /// [`Self::find_entries`].
    pub fn list_resources(
        &self,
        path: &str,
        pattern: Option<&str>,
        options: SearchOptions,
    ) -> WiringResult<Vec<String>> {
        if !self.policy.allows_resource_access(&self.module_id) {
            return Ok(Vec::new());
        }
        let loader = self.loader()?;
        Ok(loader.list_resources(path, pattern, options))
    }

    /// Retire the node: one-way transition, performed exactly once by the
    /// coordinator.
    ///
    /// Two phases: under the loader mutex, clear the validity flag and
    /// take whatever loader exists; with the lock released, hand both to
    /// the adaptor. Teardown may re-enter the runtime, so it must not run
    /// inside the node's lock.
    pub fn invalidate(&self) {
        let captured = {
            let mut slot = self.loader.lock().unwrap();
            self.valid.store(false, Ordering::Release);
            slot.take()
        };
        log::debug!("wiring invalidated for {}", self.module_id);
        self.adaptor.invalidate_wiring(self, captured);
    }

    fn provided_snapshot(&self) -> Arc<Vec<Wire>> {
        Arc::clone(&self.provided.read().unwrap())
    }

    fn required_snapshot(&self) -> Arc<Vec<Wire>> {
        Arc::clone(&self.required.read().unwrap())
    }
}

fn filter_namespace<T, F>(items: &[T], namespace: Option<&str>, ns_of: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    match namespace {
        None => items.to_vec(),
        Some(ns) => items.iter().filter(|i| ns_of(i) == ns).cloned().collect(),
    }
}

impl fmt::Display for WiringNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_valid() { "valid" } else { "stale" };
        write!(f, "wiring[{} ({})]", self.module_id, state)
    }
}

impl fmt::Debug for WiringNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WiringNode")
            .field("module_id", &self.module_id)
            .field("valid", &self.is_valid())
            .field("capabilities", &self.capabilities.len())
            .field("requirements", &self.requirements.len())
            .field("provided_wires", &self.provided_snapshot().len())
            .field("required_wires", &self.required_snapshot().len())
            .field("substituted", &self.substituted.len())
            .finish()
    }
}
