//! Edge gate routing rules
//!
//! The gate runs in front of every page request and decides, from the path and whether the
//! request is authenticated, if it passes through or is redirected. How "authenticated" is
//! established is up to the caller, see [`GateMode`].

use serde::Deserialize;

use crate::{SESSION_COOKIE, SESSION_TOKEN_COOKIE};

/// Value the legacy console stores in the session cookie once signed in
pub const AUTHENTICATED_SENTINEL: &str = "authenticated";

/// Sections requiring an authenticated session
pub const PROTECTED_PREFIXES: &[&str] = &[
    "/dashboard",
    "/customers",
    "/payments",
    "/transfers",
    "/beneficiaries",
    "/settings",
    "/reports",
];

/// Paths the gate never runs for: API routes, bundled assets, favicon and public files
pub const EXCLUDED_PREFIXES: &[&str] = &[
    "/api",
    "/_next/static",
    "/_next/image",
    "/favicon.ico",
    "/public",
];

/// How the gate establishes that a request is authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    /// Cookie value must literally equal [`AUTHENTICATED_SENTINEL`].
    ///
    /// Anybody able to set the cookie passes the gate. Kept for consoles still issuing the
    /// sentinel cookie. The session token then travels in [`SESSION_TOKEN_COOKIE`].
    Sentinel,
    /// Cookie value is a session token verified against the session store
    #[default]
    Session,
}

impl GateMode {
    /// Name of the cookie carrying the session token
    pub fn token_cookie(self) -> &'static str {
        match self {
            Self::Sentinel => SESSION_TOKEN_COOKIE,
            Self::Session => SESSION_COOKIE,
        }
    }

    /// Sentinel check of a cookie value. Only meaningful in [`GateMode::Sentinel`].
    pub fn sentinel_matches(cookie: Option<&str>) -> bool {
        cookie == Some(AUTHENTICATED_SENTINEL)
    }
}

/// Gate outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Let the request through unchanged
    Allow,
    /// Redirect to the given path
    Redirect(String),
}

/// Edge gate configuration
#[derive(Debug, Clone)]
pub struct Gate {
    root: String,
    dashboard: String,
    sign_in: String,
    protected: Vec<String>,
    excluded: Vec<String>,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            root: "/".to_owned(),
            dashboard: "/dashboard".to_owned(),
            sign_in: "/signin".to_owned(),
            protected: PROTECTED_PREFIXES.iter().map(|&p| p.to_owned()).collect(),
            excluded: EXCLUDED_PREFIXES.iter().map(|&p| p.to_owned()).collect(),
        }
    }
}

impl Gate {
    pub fn sign_in(&self) -> &str {
        &self.sign_in
    }

    /// Checks if the gate runs for the path at all
    pub fn applies_to(&self, path: &str) -> bool {
        !self
            .excluded
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Checks if the path is within a protected section
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Decides what happens with a request. Rules are evaluated in order, first match wins.
    pub fn decide(&self, path: &str, authenticated: bool) -> Decision {
        if path == self.root {
            let target = if authenticated {
                &self.dashboard
            } else {
                &self.sign_in
            };
            return Decision::Redirect(target.clone());
        }

        if !authenticated && self.is_protected(path) {
            return Decision::Redirect(self.sign_in.clone());
        }

        if authenticated && path == self.sign_in {
            return Decision::Redirect(self.dashboard.clone());
        }

        Decision::Allow
    }
}
