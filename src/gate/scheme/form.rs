//! Form-based authentication.
//!
//! The login form posts `j_username`/`j_password` to the login action, which
//! may sit outside the protected area; the stage invokes this scheme
//! unconditionally for that path.

use axum::http::StatusCode;
use tracing::{debug, error};

use super::{AuthScheme, LoginConfig, FORM_PASSWORD, FORM_USERNAME, LOGIN_ACTION};
use crate::gate::request::{GateRequest, GateResponse};
use crate::gate::AccessControlStage;

/// Authentication-method tag recorded for form logins.
pub const FORM_AUTH: &str = "FORM";

/// Form scheme: credential submission via the login action, challenge via a
/// redirect to the configured login page.
#[derive(Clone, Debug, Default)]
pub struct FormScheme;

impl AuthScheme for FormScheme {
    fn authenticate(
        &self,
        stage: &AccessControlStage,
        request: &mut GateRequest,
        response: &mut GateResponse,
        login: &LoginConfig,
    ) -> bool {
        if request.principal().is_some() {
            return true;
        }

        if request.context_relative_path() != LOGIN_ACTION {
            // Not a credential submission: challenge with the login page.
            if let Some(page) = login.login_page() {
                response.send_redirect(page);
            } else {
                response.send_error(StatusCode::UNAUTHORIZED, "Login required");
            }
            return false;
        }

        let username = request.param(FORM_USERNAME).map(str::to_string);
        let password = request.param(FORM_PASSWORD).map(str::to_string);
        if let (Some(username), Some(password)) = (username, password) {
            if let Some(principal) = stage.realm().authenticate_user(&username, &password) {
                return match stage.register(
                    request,
                    response,
                    principal,
                    FORM_AUTH,
                    Some(username),
                    Some(password),
                ) {
                    Ok(()) => true,
                    Err(err) => {
                        error!("Failed to register authentication: {err}");
                        response.send_error(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "Authentication could not be registered",
                        );
                        false
                    }
                };
            }
            debug!(username, "form credentials rejected");
        }

        if let Some(page) = login.error_page() {
            response.send_redirect(page);
        } else {
            response.send_error(StatusCode::UNAUTHORIZED, "Invalid username or password");
        }
        false
    }
}
