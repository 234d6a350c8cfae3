//! Lifecycle and resource-gate behavior of a wiring node: loader caching,
//! the invalidation handshake, permission gating, and re-wiring without
//! invalidation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use modwire::{
    Capability, Loader, Requirement, Revision, ScopedPolicy, SearchOptions, Wire, WiringAdaptor,
    WiringError, WiringNode, WiringResult, PACKAGE_NAMESPACE,
};
use pretty_assertions::assert_eq;

struct FixedRevision {
    id: String,
    current: bool,
}

impl Revision for FixedRevision {
    fn module_id(&self) -> &str {
        &self.id
    }

    fn is_current(&self) -> bool {
        self.current
    }
}

struct EchoLoader;

impl Loader for EchoLoader {
    fn find_entries(
        &self,
        path: &str,
        pattern: Option<&str>,
        _options: SearchOptions,
    ) -> Vec<String> {
        vec![format!("{}/{}", path, pattern.unwrap_or("*"))]
    }

    fn list_resources(
        &self,
        path: &str,
        _pattern: Option<&str>,
        _options: SearchOptions,
    ) -> Vec<String> {
        vec![format!("{}/resource", path)]
    }
}

/// Adaptor recording factory attempts and the invalidation handshake.
#[derive(Default)]
struct RecordingAdaptor {
    attempts: AtomicUsize,
    failures_left: AtomicUsize,
    invalidations: AtomicUsize,
    // Some(true) = a loader was handed over, Some(false) = none existed.
    handed_loader: Mutex<Option<bool>>,
}

impl RecordingAdaptor {
    fn failing_first(n: usize) -> Self {
        let adaptor = Self::default();
        adaptor.failures_left.store(n, Ordering::SeqCst);
        adaptor
    }
}

impl WiringAdaptor for RecordingAdaptor {
    fn create_loader(&self, _wiring: &Arc<WiringNode>) -> WiringResult<Arc<dyn Loader>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failures_left.load(Ordering::SeqCst) > 0 {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
            return Err(WiringError::LoaderFailed("backing store offline".into()));
        }
        Ok(Arc::new(EchoLoader))
    }

    fn invalidate_wiring(&self, _wiring: &WiringNode, loader: Option<Arc<dyn Loader>>) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        *self.handed_loader.lock().unwrap() = Some(loader.is_some());
    }
}

fn revision(id: &str) -> Arc<dyn Revision> {
    Arc::new(FixedRevision {
        id: id.to_string(),
        current: true,
    })
}

fn package_wire(name: &str, provider: &str, requirer: &str) -> Wire {
    Wire::new(
        Capability::package(name),
        Requirement::new(PACKAGE_NAMESPACE).with_filter(format!("(package={})", name)),
        provider,
        requirer,
    )
}

#[test]
fn test_loader_created_once_and_cached() {
    let adaptor = Arc::new(RecordingAdaptor::default());
    let node = WiringNode::build(&revision("mod.a"), adaptor.clone()).finish();

    let first = node.loader().unwrap();
    let second = node.loader().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(adaptor.attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_loader_failure_propagates_and_is_not_cached() {
    let adaptor = Arc::new(RecordingAdaptor::failing_first(1));
    let node = WiringNode::build(&revision("mod.a"), adaptor.clone()).finish();

    assert!(matches!(node.loader(), Err(WiringError::LoaderFailed(_))));
    // The failed attempt left the slot empty; the next call retries.
    let retried = node.loader().unwrap();
    assert!(Arc::ptr_eq(&retried, &node.loader().unwrap()));
    assert_eq!(adaptor.attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_checked_loader_respects_policy() {
    let adaptor = Arc::new(RecordingAdaptor::default());
    let denied = WiringNode::build(&revision("mod.a"), adaptor.clone())
        .policy(Arc::new(ScopedPolicy::allowing(["other.mod"])))
        .finish();

    assert!(matches!(denied.checked_loader(), Err(WiringError::Stale)));
    assert_eq!(adaptor.attempts.load(Ordering::SeqCst), 0);

    let allowed = WiringNode::build(&revision("mod.a"), adaptor.clone())
        .policy(Arc::new(ScopedPolicy::allowing(["mod.a"])))
        .finish();
    assert!(allowed.checked_loader().is_ok());
    assert_eq!(adaptor.attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_denied_resource_queries_degrade_to_empty_without_loader() {
    let adaptor = Arc::new(RecordingAdaptor::default());
    let node = WiringNode::build(&revision("mod.a"), adaptor.clone())
        .policy(Arc::new(ScopedPolicy::allowing(["other.mod"])))
        .finish();

    let entries = node
        .find_entries("META-INF", None, SearchOptions::recursive())
        .unwrap();
    assert_eq!(entries, Vec::<String>::new());
    let resources = node
        .list_resources("conf", None, SearchOptions::default())
        .unwrap();
    assert_eq!(resources, Vec::<String>::new());
    // Denial must never reach the factory.
    assert_eq!(adaptor.attempts.load(Ordering::SeqCst), 0);
}

#[test]
fn test_resource_queries_delegate_to_loader_when_allowed() {
    let adaptor = Arc::new(RecordingAdaptor::default());
    let node = WiringNode::build(&revision("mod.a"), adaptor.clone()).finish();

    let entries = node
        .find_entries("lib", Some("*.bin"), SearchOptions::recursive())
        .unwrap();
    assert_eq!(entries, vec!["lib/*.bin".to_string()]);
    let resources = node.list_resources("conf", None, SearchOptions::local()).unwrap();
    assert_eq!(resources, vec!["conf/resource".to_string()]);
    assert_eq!(adaptor.attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_resource_queries_signal_stale_on_invalid_node() {
    let adaptor = Arc::new(RecordingAdaptor::default());
    let node = WiringNode::build(&revision("mod.a"), adaptor.clone()).finish();
    node.invalidate();

    // Unavailable, not empty: callers must re-resolve, not conclude
    // "no resources".
    assert!(matches!(
        node.find_entries("lib", None, SearchOptions::default()),
        Err(WiringError::Stale)
    ));
    assert!(matches!(
        node.list_resources("conf", None, SearchOptions::default()),
        Err(WiringError::Stale)
    ));
    assert_eq!(adaptor.attempts.load(Ordering::SeqCst), 0);
}

#[test]
fn test_invalidate_hands_existing_loader_to_adaptor() {
    let adaptor = Arc::new(RecordingAdaptor::default());
    let node = WiringNode::build(&revision("mod.a"), adaptor.clone()).finish();
    node.loader().unwrap();

    node.invalidate();
    assert_eq!(adaptor.invalidations.load(Ordering::SeqCst), 1);
    assert_eq!(*adaptor.handed_loader.lock().unwrap(), Some(true));

    assert!(matches!(node.loader(), Err(WiringError::Stale)));
    assert_eq!(adaptor.attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_invalidate_without_loader_hands_none() {
    let adaptor = Arc::new(RecordingAdaptor::default());
    let node = WiringNode::build(&revision("mod.a"), adaptor.clone()).finish();

    node.invalidate();
    assert_eq!(adaptor.invalidations.load(Ordering::SeqCst), 1);
    assert_eq!(*adaptor.handed_loader.lock().unwrap(), Some(false));
}

#[test]
fn test_rewiring_replaces_snapshot_without_invalidating() {
    let adaptor = Arc::new(RecordingAdaptor::default());
    let node = WiringNode::build(&revision("mod.a"), adaptor.clone())
        .provided_wires(vec![package_wire("a.one", "mod.a", "mod.b")])
        .finish();

    // A dynamically attached wire arrives as a whole-set replacement.
    node.set_provided_wires(vec![
        package_wire("a.one", "mod.a", "mod.b"),
        package_wire("a.two", "mod.a", "mod.c"),
    ]);
    node.set_required_wires(vec![package_wire("b.one", "mod.d", "mod.a")]);

    assert!(node.is_valid());
    let provided = node.provided_wires(None).unwrap();
    assert_eq!(provided.len(), 2);
    assert_eq!(provided[1].requirer, "mod.c");
    let required = node.required_wires(None).unwrap();
    assert_eq!(required.len(), 1);
    assert_eq!(required[0].provider, "mod.d");
    assert_eq!(adaptor.invalidations.load(Ordering::SeqCst), 0);
}

#[test]
fn test_display_keeps_identity_after_invalidation() {
    let adaptor = Arc::new(RecordingAdaptor::default());
    let node = WiringNode::build(&revision("mod.a"), adaptor).finish();
    assert_eq!(node.to_string(), "wiring[mod.a (valid)]");

    node.invalidate();
    assert_eq!(node.to_string(), "wiring[mod.a (stale)]");
    assert_eq!(node.module_id(), "mod.a");
}
