//! Pluggable authentication schemes.
//!
//! Every scheme implements the same contract: verify the caller's credentials
//! and return `true`, or write the appropriate challenge into the response and
//! return `false`. Schemes call back into the stage's `register` once they
//! have independently verified a credential pair.

use super::request::{GateRequest, GateResponse};
use super::AccessControlStage;

pub mod basic;
pub mod form;

pub use basic::{BasicScheme, BASIC_AUTH};
pub use form::{FormScheme, FORM_AUTH};

/// Context-relative path of the login submission action.
pub const LOGIN_ACTION: &str = "/j_security_check";

/// Form field carrying the username on login submission.
pub const FORM_USERNAME: &str = "j_username";

/// Form field carrying the password on login submission.
pub const FORM_PASSWORD: &str = "j_password";

/// How authentication should be performed for a protected area.
#[derive(Clone, Debug)]
pub struct LoginConfig {
    auth_method: String,
    login_page: Option<String>,
    error_page: Option<String>,
}

impl LoginConfig {
    #[must_use]
    pub fn new(auth_method: impl Into<String>) -> Self {
        Self {
            auth_method: auth_method.into(),
            login_page: None,
            error_page: None,
        }
    }

    #[must_use]
    pub fn with_login_page(mut self, page: impl Into<String>) -> Self {
        self.login_page = Some(page.into());
        self
    }

    #[must_use]
    pub fn with_error_page(mut self, page: impl Into<String>) -> Self {
        self.error_page = Some(page.into());
        self
    }

    #[must_use]
    pub fn auth_method(&self) -> &str {
        &self.auth_method
    }

    #[must_use]
    pub fn login_page(&self) -> Option<&str> {
        self.login_page.as_deref()
    }

    #[must_use]
    pub fn error_page(&self) -> Option<&str> {
        self.error_page.as_deref()
    }
}

/// Credential challenge and verification strategy.
pub trait AuthScheme: Send + Sync {
    /// Authenticate the caller under the given login configuration.
    ///
    /// Returns `true` once an identity is established on the request. On
    /// `false` the challenge has already been written into the response.
    fn authenticate(
        &self,
        stage: &AccessControlStage,
        request: &mut GateRequest,
        response: &mut GateResponse,
        login: &LoginConfig,
    ) -> bool;
}
