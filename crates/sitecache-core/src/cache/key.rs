use std::fmt;

use serde::{Deserialize, Serialize};

/// Resource families the dashboard caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Sites,
    Projects,
    Stocks,
    Vendors,
    Contractors,
    Labour,
    Attendance,
    Machines,
    Accounts,
    Reports,
    Dashboard,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Sites => "sites",
            Resource::Projects => "projects",
            Resource::Stocks => "stocks",
            Resource::Vendors => "vendors",
            Resource::Contractors => "contractors",
            Resource::Labour => "labour",
            Resource::Attendance => "attendance",
            Resource::Machines => "machines",
            Resource::Accounts => "accounts",
            Resource::Reports => "reports",
            Resource::Dashboard => "dashboard",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a cached value: a resource family plus an optional scope
/// (site id, date range, page...).
///
/// Two callers caching different data can only collide if they pick the
/// same resource *and* scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub resource: Resource,
    pub scope: Option<String>,
}

impl CacheKey {
    /// Key for the unscoped listing of a resource.
    pub fn all(resource: Resource) -> Self {
        Self {
            resource,
            scope: None,
        }
    }

    pub fn scoped(resource: Resource, scope: impl Into<String>) -> Self {
        Self {
            resource,
            scope: Some(scope.into()),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}:{}", self.resource, scope),
            None => write!(f, "{}", self.resource),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        assert_eq!(CacheKey::all(Resource::Stocks).to_string(), "stocks");
        assert_eq!(
            CacheKey::scoped(Resource::Attendance, "site-7/2026-10").to_string(),
            "attendance:site-7/2026-10"
        );
    }

    #[test]
    fn test_same_scope_different_resource_are_distinct() {
        let a = CacheKey::scoped(Resource::Vendors, "12");
        let b = CacheKey::scoped(Resource::Contractors, "12");
        assert_ne!(a, b);
        assert_eq!(a, CacheKey::scoped(Resource::Vendors, "12".to_string()));
    }
}
