//! Protocol-level data model carried through the pipeline.
//!
//! `GateRequest` and `GateResponse` are the stage's view of an in-flight HTTP
//! exchange. Collaborators that deny access write the challenge or redirect
//! into the response before returning, so a halted pipeline already carries
//! everything the client needs to see.

use axum::http::{
    header::{HOST, LOCATION, SET_COOKIE},
    HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
};
use serde::Serialize;
use std::collections::HashMap;

/// Verified identity of the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Principal {
    name: String,
    roles: Vec<String>,
}

impl Principal {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Authentication scheme tag plus the principal it established.
///
/// A request carries at most one record at a time; re-registering replaces it.
#[derive(Clone, Debug)]
pub struct AuthenticationRecord {
    auth_type: String,
    principal: Principal,
}

impl AuthenticationRecord {
    #[must_use]
    pub fn new(auth_type: impl Into<String>, principal: Principal) -> Self {
        Self {
            auth_type: auth_type.into(),
            principal,
        }
    }

    #[must_use]
    pub fn auth_type(&self) -> &str {
        &self.auth_type
    }

    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}

/// The stage's view of an inbound request.
#[derive(Debug)]
pub struct GateRequest {
    method: Method,
    path: String,
    context_path: String,
    headers: HeaderMap,
    params: HashMap<String, String>,
    secure: bool,
    session_id: Option<String>,
    auth: Option<AuthenticationRecord>,
    notes: HashMap<String, String>,
}

impl GateRequest {
    /// Create a request for the given method and decoded path.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            context_path: String::new(),
            headers: HeaderMap::new(),
            params: HashMap::new(),
            secure: false,
            session_id: None,
            auth: None,
            notes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = context_path.into();
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    /// Request path with the deployment context prefix stripped.
    #[must_use]
    pub fn context_relative_path(&self) -> &str {
        self.path
            .strip_prefix(self.context_path.as_str())
            .unwrap_or(&self.path)
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.headers.get(HOST).and_then(|value| value.to_str().ok())
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn secure(&self) -> bool {
        self.secure
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
    }

    #[must_use]
    pub fn auth(&self) -> Option<&AuthenticationRecord> {
        self.auth.as_ref()
    }

    /// Principal established for this request, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.auth.as_ref().map(AuthenticationRecord::principal)
    }

    pub fn set_auth(&mut self, record: AuthenticationRecord) {
        self.auth = Some(record);
    }

    #[must_use]
    pub fn note(&self, key: &str) -> Option<&str> {
        self.notes.get(key).map(String::as_str)
    }

    pub fn set_note(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.notes.insert(key.into(), value.into());
    }
}

/// Response under construction while the pipeline runs.
///
/// Headers written here survive a `Continue` outcome; the surrounding server
/// merges them into whatever the downstream stage produces.
#[derive(Debug)]
pub struct GateResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<String>,
}

impl Default for GateResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl GateResponse {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn set_header(&mut self, name: HeaderName, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
    }

    /// Header value as a string, mainly for assertions in tests.
    #[must_use]
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Append a cookie without clobbering ones already set.
    ///
    /// `max_age` of `None` yields a browser-session cookie.
    pub fn add_cookie(&mut self, name: &str, value: &str, path: &str, max_age: Option<i64>) {
        let mut cookie = format!("{name}={value}; Path={path}; HttpOnly");
        if let Some(seconds) = max_age {
            cookie.push_str(&format!("; Max-Age={seconds}"));
        }
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            self.headers.append(SET_COOKIE, value);
        }
    }

    /// All cookies emitted so far, for assertions in tests.
    #[must_use]
    pub fn cookies(&self) -> Vec<&str> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect()
    }

    pub fn send_redirect(&mut self, location: &str) {
        self.status = StatusCode::FOUND;
        self.set_header(LOCATION, location);
    }

    pub fn send_error(&mut self, status: StatusCode, message: &str) {
        self.status = status;
        self.body = Some(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{CACHE_CONTROL, LOCATION};

    #[test]
    fn principal_roles() {
        let principal = Principal::new("alice").with_roles(vec!["user".to_string()]);
        assert_eq!(principal.name(), "alice");
        assert!(principal.has_role("user"));
        assert!(!principal.has_role("admin"));
    }

    #[test]
    fn context_relative_path_strips_prefix() {
        let request =
            GateRequest::new(Method::GET, "/app/j_security_check").with_context_path("/app");
        assert_eq!(request.context_relative_path(), "/j_security_check");
    }

    #[test]
    fn context_relative_path_without_prefix_is_full_path() {
        let request = GateRequest::new(Method::GET, "/other/page").with_context_path("/app");
        assert_eq!(request.context_relative_path(), "/other/page");
    }

    #[test]
    fn request_carries_one_auth_record() {
        let mut request = GateRequest::new(Method::GET, "/");
        request.set_auth(AuthenticationRecord::new("BASIC", Principal::new("alice")));
        request.set_auth(AuthenticationRecord::new("FORM", Principal::new("bob")));
        assert_eq!(request.auth().map(AuthenticationRecord::auth_type), Some("FORM"));
        assert_eq!(request.principal().map(Principal::name), Some("bob"));
    }

    #[test]
    fn response_header_round_trip() {
        let mut response = GateResponse::new();
        response.set_header(CACHE_CONTROL, "no-cache");
        assert_eq!(response.header(&CACHE_CONTROL), Some("no-cache"));
    }

    #[test]
    fn redirect_sets_location_and_status() {
        let mut response = GateResponse::new();
        response.send_redirect("https://example.com/secure");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.header(&LOCATION), Some("https://example.com/secure"));
    }

    #[test]
    fn session_cookie_has_no_max_age() {
        let mut response = GateResponse::new();
        response.add_cookie("gardisto_sso", "F00D", "/", None);
        let cookies = response.cookies();
        assert_eq!(cookies, vec!["gardisto_sso=F00D; Path=/; HttpOnly"]);
    }
}
