//! Descriptor and wire types for module wiring.
//!
//! Design goals:
//! - Small, serializable value types fixed at resolution time.
//! - Insertion-ordered attribute/directive maps so queries preserve
//!   declaration order.
//! - Minimal helpers; the wiring node owns all query logic.
//!
//! Unit tests are colocated at the bottom of this file.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Namespace of package capabilities and requirements.
pub const PACKAGE_NAMESPACE: &str = "module.package";

/// Namespace of host wires, the edges attaching a fragment to its host.
pub const HOST_NAMESPACE: &str = "module.host";

/// Attribute key carrying the package name of a package capability.
pub const PACKAGE_NAME_ATTR: &str = "package";

/// Attribute map of a capability (insertion-ordered, typed values).
pub type AttributeMap = IndexMap<String, Value>;

/// Directive map of a capability or requirement (insertion-ordered).
pub type DirectiveMap = IndexMap<String, String>;

/// A named, attributed fact a module revision offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    /// Namespace the capability is declared in.
    pub namespace: String,
    /// Typed attributes describing what is offered.
    #[serde(default)]
    pub attributes: AttributeMap,
    /// Directives constraining how the capability may be used.
    #[serde(default)]
    pub directives: DirectiveMap,
}

impl Capability {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            attributes: AttributeMap::new(),
            directives: DirectiveMap::new(),
        }
    }

    /// Convenience constructor for a package export capability.
    pub fn package(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self::new(PACKAGE_NAMESPACE).with_attribute(PACKAGE_NAME_ATTR, name)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_directive(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.directives.insert(key.into(), value.into());
        self
    }

    /// The package-name attribute, when present and a string.
    pub fn package_name(&self) -> Option<&str> {
        self.attributes.get(PACKAGE_NAME_ATTR).and_then(Value::as_str)
    }
}

/// A named, filtered need a module revision declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Namespace the requirement is declared against.
    pub namespace: String,
    /// Filter expression a satisfying capability must match, if any.
    #[serde(default)]
    pub filter: Option<String>,
    /// Directives constraining how the requirement resolves.
    #[serde(default)]
    pub directives: DirectiveMap,
}

impl Requirement {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            filter: None,
            directives: DirectiveMap::new(),
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_directive(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.directives.insert(key.into(), value.into());
        self
    }
}

/// A resolved edge linking one revision's requirement to another revision's
/// capability. Wires are created by the resolver; the wiring node only
/// stores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    /// The capability end of the edge.
    pub capability: Capability,
    /// The requirement end of the edge.
    pub requirement: Requirement,
    /// Module id of the revision providing the capability.
    pub provider: String,
    /// Module id of the revision declaring the requirement.
    pub requirer: String,
}

impl Wire {
    pub fn new(
        capability: Capability,
        requirement: Requirement,
        provider: impl Into<String>,
        requirer: impl Into<String>,
    ) -> Self {
        Self {
            capability,
            requirement,
            provider: provider.into(),
            requirer: requirer.into(),
        }
    }

    /// Namespace of the wire, taken from its capability end.
    pub fn namespace(&self) -> &str {
        &self.capability.namespace
    }
}
