//! Policy engine contract and an in-memory implementation.
//!
//! The realm resolves the constraints matching a request and evaluates
//! confidentiality and resource-authorization policy. Both boolean checks
//! write the challenge, redirect, or error status into the response before
//! returning `false`, so the stage can halt without touching the response
//! itself.

use axum::http::StatusCode;
use std::collections::HashMap;
use tracing::debug;

use super::constraint::SecurityConstraint;
use super::request::{GateRequest, GateResponse, Principal};

/// Policy engine evaluated by the pipeline.
pub trait Realm: Send + Sync {
    /// Name of this policy domain. Must be present once an authentication has
    /// succeeded under it.
    fn realm_name(&self) -> Option<&str>;

    /// Constraints matching this request, or `None` for an unprotected
    /// resource.
    fn find_constraints(&self, request: &GateRequest) -> Option<Vec<SecurityConstraint>>;

    /// Whether the transport satisfies the confidentiality requirement of the
    /// matched constraints. Writes a redirect or error on failure.
    fn check_confidentiality(
        &self,
        request: &GateRequest,
        response: &mut GateResponse,
        constraints: &[SecurityConstraint],
    ) -> bool;

    /// Whether the established identity may access this resource. Writes an
    /// error status on failure.
    fn check_resource_authorization(
        &self,
        request: &GateRequest,
        response: &mut GateResponse,
        constraints: &[SecurityConstraint],
    ) -> bool;

    /// Verify a credential pair against this realm's user base.
    fn authenticate_user(&self, username: &str, password: &str) -> Option<Principal>;
}

struct UserEntry {
    password: String,
    roles: Vec<String>,
}

/// In-memory realm for tests and the demo server.
///
/// Holds a static user table and a static constraint list; matching is plain
/// path matching on the constraint patterns.
#[derive(Default)]
pub struct MemoryRealm {
    name: String,
    users: HashMap<String, UserEntry>,
    constraints: Vec<SecurityConstraint>,
}

impl MemoryRealm {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            users: HashMap::new(),
            constraints: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_user(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        roles: Vec<String>,
    ) -> Self {
        self.users.insert(
            username.into(),
            UserEntry {
                password: password.into(),
                roles,
            },
        );
        self
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: SecurityConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

impl Realm for MemoryRealm {
    fn realm_name(&self) -> Option<&str> {
        if self.name.is_empty() {
            None
        } else {
            Some(&self.name)
        }
    }

    fn find_constraints(&self, request: &GateRequest) -> Option<Vec<SecurityConstraint>> {
        let matched: Vec<SecurityConstraint> = self
            .constraints
            .iter()
            .filter(|constraint| constraint.matches(request.context_relative_path()))
            .cloned()
            .collect();
        if matched.is_empty() {
            None
        } else {
            Some(matched)
        }
    }

    fn check_confidentiality(
        &self,
        request: &GateRequest,
        response: &mut GateResponse,
        constraints: &[SecurityConstraint],
    ) -> bool {
        if !constraints.iter().any(SecurityConstraint::confidential) || request.secure() {
            return true;
        }
        // Redirect to the secure channel when we know where it is.
        if let Some(host) = request.host() {
            let host = host.split(':').next().unwrap_or(host);
            response.send_redirect(&format!("https://{host}{}", request.path()));
        } else {
            response.send_error(
                StatusCode::FORBIDDEN,
                "This request requires a confidential transport",
            );
        }
        debug!(path = request.path(), "confidentiality requirement not met");
        false
    }

    fn check_resource_authorization(
        &self,
        request: &GateRequest,
        response: &mut GateResponse,
        constraints: &[SecurityConstraint],
    ) -> bool {
        let restricted: Vec<&SecurityConstraint> = constraints
            .iter()
            .filter(|constraint| constraint.requires_auth())
            .collect();
        if restricted.is_empty() {
            return true;
        }
        let authorized = request.principal().is_some_and(|principal| {
            restricted.iter().any(|constraint| {
                // An auth constraint without roles admits any authenticated
                // caller.
                constraint.roles().is_empty()
                    || constraint.roles().iter().any(|role| principal.has_role(role))
            })
        });
        if !authorized {
            debug!(path = request.path(), "resource authorization denied");
            response.send_error(
                StatusCode::FORBIDDEN,
                "Access to the requested resource has been denied",
            );
        }
        authorized
    }

    fn authenticate_user(&self, username: &str, password: &str) -> Option<Principal> {
        let entry = self.users.get(username)?;
        if entry.password == password {
            Some(Principal::new(username).with_roles(entry.roles.clone()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::LOCATION, Method};

    fn realm() -> MemoryRealm {
        MemoryRealm::new("Gardisto")
            .with_user("alice", "secret", vec!["user".to_string()])
            .with_constraint(
                SecurityConstraint::new("/secure/*").with_roles(vec!["user".to_string()]),
            )
            .with_constraint(SecurityConstraint::new("/pay/*").with_auth().with_confidentiality())
    }

    #[test]
    fn unmatched_path_has_no_constraints() {
        let request = GateRequest::new(Method::GET, "/public/index.html");
        assert!(realm().find_constraints(&request).is_none());
    }

    #[test]
    fn matched_path_returns_constraints() {
        let request = GateRequest::new(Method::GET, "/secure/page");
        let constraints = realm().find_constraints(&request).expect("constraints");
        assert_eq!(constraints.len(), 1);
        assert!(constraints[0].requires_auth());
    }

    #[test]
    fn confidentiality_redirects_insecure_requests() {
        let realm = realm();
        let request = GateRequest::new(Method::GET, "/pay/checkout")
            .with_header(axum::http::header::HOST, "shop.example.com:8080");
        let constraints = realm.find_constraints(&request).expect("constraints");
        let mut response = GateResponse::new();
        assert!(!realm.check_confidentiality(&request, &mut response, &constraints));
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.header(&LOCATION),
            Some("https://shop.example.com/pay/checkout")
        );
    }

    #[test]
    fn confidentiality_passes_secure_transport() {
        let realm = realm();
        let request = GateRequest::new(Method::GET, "/pay/checkout").with_secure(true);
        let constraints = realm.find_constraints(&request).expect("constraints");
        let mut response = GateResponse::new();
        assert!(realm.check_confidentiality(&request, &mut response, &constraints));
    }

    #[test]
    fn authorization_requires_matching_role() {
        let realm = realm();
        let mut request = GateRequest::new(Method::GET, "/secure/page");
        let constraints = realm.find_constraints(&request).expect("constraints");

        let mut response = GateResponse::new();
        assert!(!realm.check_resource_authorization(&request, &mut response, &constraints));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        request.set_auth(super::super::request::AuthenticationRecord::new(
            "BASIC",
            Principal::new("alice").with_roles(vec!["user".to_string()]),
        ));
        let mut response = GateResponse::new();
        assert!(realm.check_resource_authorization(&request, &mut response, &constraints));
    }

    #[test]
    fn authenticate_user_checks_password() {
        let realm = realm();
        let principal = realm.authenticate_user("alice", "secret").expect("principal");
        assert_eq!(principal.name(), "alice");
        assert!(principal.has_role("user"));
        assert!(realm.authenticate_user("alice", "wrong").is_none());
        assert!(realm.authenticate_user("mallory", "secret").is_none());
    }
}
