//! Access policies for the resource query surface.
//!
//! A policy decides, per module, whether callers may list entries and
//! resources or obtain the loader. Denial is secure-by-default: resource
//! queries degrade to an empty answer and loader access degrades to the
//! same unavailable signal an invalidated node gives, so callers cannot
//! probe for the presence of protected content.

use std::collections::HashSet;

/// Permission checks consulted before a wiring node touches its loader.
pub trait ResourcePolicy: Send + Sync {
    /// Whether `module_id` may list entries and resources through its
    /// wiring.
    fn allows_resource_access(&self, module_id: &str) -> bool;

    /// Whether callers may obtain the loader of `module_id`.
    fn allows_loader_access(&self, module_id: &str) -> bool;
}

/// Grants every request. The default for embedders without sandboxing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ResourcePolicy for AllowAll {
    fn allows_resource_access(&self, _module_id: &str) -> bool {
        true
    }

    fn allows_loader_access(&self, _module_id: &str) -> bool {
        true
    }
}

/// Allowlist policy: only the named modules pass either check.
#[derive(Debug, Clone, Default)]
pub struct ScopedPolicy {
    allowed: HashSet<String>,
}

impl ScopedPolicy {
    pub fn allowing<I, T>(modules: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            allowed: modules.into_iter().map(|m| m.into()).collect(),
        }
    }
}

impl ResourcePolicy for ScopedPolicy {
    fn allows_resource_access(&self, module_id: &str) -> bool {
        self.allowed.contains(module_id)
    }

    fn allows_loader_access(&self, module_id: &str) -> bool {
        self.allowed.contains(module_id)
    }
}
