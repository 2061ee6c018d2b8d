//! HTTP Basic authentication.

use axum::http::{
    header::{AUTHORIZATION, WWW_AUTHENTICATE},
    StatusCode,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{debug, error};

use super::{AuthScheme, LoginConfig};
use crate::gate::request::{GateRequest, GateResponse};
use crate::gate::AccessControlStage;

/// Authentication-method tag recorded for Basic logins.
pub const BASIC_AUTH: &str = "BASIC";

/// Basic scheme: credentials from the `Authorization` header, challenged with
/// `WWW-Authenticate` on failure.
#[derive(Clone, Debug, Default)]
pub struct BasicScheme;

impl AuthScheme for BasicScheme {
    fn authenticate(
        &self,
        stage: &AccessControlStage,
        request: &mut GateRequest,
        response: &mut GateResponse,
        _login: &LoginConfig,
    ) -> bool {
        // A previously restored identity satisfies the constraint as-is.
        if request.principal().is_some() {
            return true;
        }

        let credentials = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(decode_credentials);
        if let Some((username, password)) = credentials {
            if let Some(principal) = stage.realm().authenticate_user(&username, &password) {
                return match stage.register(
                    request,
                    response,
                    principal,
                    BASIC_AUTH,
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
            debug!(username, "basic credentials rejected");
        }

        let realm_name = stage.realm().realm_name().unwrap_or("Authentication required");
        response.set_header(WWW_AUTHENTICATE, &format!("Basic realm=\"{realm_name}\""));
        response.set_status(StatusCode::UNAUTHORIZED);
        false
    }
}

/// Decode a `Basic` authorization header into a credential pair.
fn decode_credentials(header: &str) -> Option<(String, String)> {
    let encoded = header.trim().strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
