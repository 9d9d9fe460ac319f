use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub enum EndpointRole {
    Admin,
    SiteManager,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRole::Admin => f.write_str("admin"),
            EndpointRole::SiteManager => f.write_str("siteManager"),
        }
    }
}

/// A read-only backend route worth probing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub method: String,
    pub path: String,
    pub description: String,
}

impl Endpoint {
    pub fn get(path: &str, description: &str) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.to_string(),
            description: description.to_string(),
        }
    }
}

/// (path, description) of every admin route probed by `probe_all`.
/// New backend routes must be added here to be covered.
const ADMIN_ROUTES: &[(&str, &str)] = &[
    ("/api/dashboard/stats", "Dashboard statistics"),
    ("/api/sites", "Construction sites"),
    ("/api/projects", "Projects"),
    ("/api/attendance", "Attendance records"),
    ("/api/labour", "Labour register"),
    ("/api/stocks", "Stock inventory"),
    ("/api/vendors", "Vendors"),
    ("/api/contractors", "Contractors"),
    ("/api/machines", "Machines"),
    ("/api/accounts", "Accounts"),
    ("/api/reports/summary", "Report summary"),
    ("/api/users", "Users"),
];

const SITE_MANAGER_ROUTES: &[(&str, &str)] = &[
    ("/api/site-manager/dashboard", "Site dashboard"),
    ("/api/site-manager/projects", "Assigned projects"),
    ("/api/site-manager/attendance", "Site attendance"),
    ("/api/site-manager/labour", "Site labour"),
    ("/api/site-manager/stocks", "Site stock"),
    ("/api/site-manager/machines", "Site machines"),
];

/// Feature name -> routes that must all answer for the feature to work.
const FEATURE_ROUTES: &[(&str, &[&str])] = &[
    ("Attendance", &["/api/attendance", "/api/labour", "/api/sites"]),
    ("Labour", &["/api/labour", "/api/contractors", "/api/sites"]),
    ("Stock", &["/api/stocks", "/api/projects", "/api/vendors"]),
    ("Vendors", &["/api/vendors", "/api/stocks"]),
    ("Contractors", &["/api/contractors", "/api/labour"]),
    ("Machines", &["/api/machines", "/api/sites"]),
    ("Accounts", &["/api/accounts", "/api/vendors", "/api/contractors"]),
    ("Reports", &["/api/reports/summary", "/api/dashboard/stats"]),
    ("Projects", &["/api/projects", "/api/sites"]),
];

fn build(routes: &[(&str, &str)]) -> Vec<Endpoint> {
    routes
        .iter()
        .map(|(path, description)| Endpoint::get(path, description))
        .collect()
}

pub fn admin_catalog() -> Vec<Endpoint> {
    build(ADMIN_ROUTES)
}

pub fn site_manager_catalog() -> Vec<Endpoint> {
    build(SITE_MANAGER_ROUTES)
}

pub fn known_features() -> Vec<&'static str> {
    FEATURE_ROUTES.iter().map(|(name, _)| *name).collect()
}

/// Look up a feature case-insensitively. Returns its canonical name and routes.
pub fn feature_routes(name: &str) -> Option<(&'static str, &'static [&'static str])> {
    let wanted = name.trim();
    FEATURE_ROUTES
        .iter()
        .find(|(feature, _)| feature.eq_ignore_ascii_case(wanted))
        .map(|(feature, routes)| (*feature, *routes))
}

/// Human description for a path, falling back to the path itself.
pub fn describe(path: &str) -> String {
    ADMIN_ROUTES
        .iter()
        .chain(SITE_MANAGER_ROUTES.iter())
        .find(|(p, _)| *p == path)
        .map(|(_, description)| description.to_string())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogs_are_read_only_routes() {
        for endpoint in admin_catalog().iter().chain(site_manager_catalog().iter()) {
            assert_eq!(endpoint.method, "GET");
            assert!(endpoint.path.starts_with("/api/"));
        }
    }

    #[test]
    fn test_feature_lookup_is_case_insensitive() {
        let (name, routes) = feature_routes("stock").expect("Stock is a known feature");
        assert_eq!(name, "Stock");
        assert_eq!(routes, &["/api/stocks", "/api/projects", "/api/vendors"]);
        assert!(feature_routes(" ATTENDANCE ").is_some());
        assert!(feature_routes("Payroll").is_none());
    }

    #[test]
    fn test_every_feature_route_is_in_admin_catalog() {
        let admin = admin_catalog();
        for (_, routes) in FEATURE_ROUTES {
            for route in *routes {
                assert!(admin.iter().any(|e| e.path == *route), "missing {}", route);
            }
        }
    }

    #[test]
    fn test_describe_falls_back_to_path() {
        assert_eq!(describe("/api/stocks"), "Stock inventory");
        assert_eq!(describe("/api/unknown"), "/api/unknown");
    }

    #[test]
    fn test_role_serializes_camel_case() {
        assert_eq!(serde_json::to_string(&EndpointRole::SiteManager).unwrap(), "\"siteManager\"");
        assert_eq!(EndpointRole::Admin.to_string(), "admin");
    }
}
