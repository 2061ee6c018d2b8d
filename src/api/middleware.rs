//! Adapter mounting the access-control stage as axum middleware.
//!
//! Converts the framework request into the stage's protocol view, runs the
//! pipeline, and either forwards to the inner service or materializes the
//! halted response. Headers written by the stage survive a pass-through so
//! cache-suppression and SSO cookies reach the client either way.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::gate::{scheme::LOGIN_ACTION, AccessControlStage, GateRequest, GateResponse, Outcome};

/// Name of the cookie carrying the session identifier.
pub const SESSION_COOKIE: &str = "gardisto_session";

/// Largest login form body the adapter is willing to buffer.
const MAX_FORM_BYTES: usize = 16 * 1024;

pub async fn access_control(
    State(stage): State<Arc<AccessControlStage>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut gate_request, request) = match into_gate_request(request).await {
        Ok(converted) => converted,
        Err(status) => return status.into_response(),
    };

    // Make sure the request is bound to a session before the stage looks for
    // cached identity; the stage itself never creates sessions.
    let mut issue_session_cookie = None;
    if let Some(session) = stage.sessions().find(&gate_request, true) {
        if gate_request.session_id() != Some(session.id()) {
            gate_request.set_session_id(session.id());
            issue_session_cookie = Some(session.id().to_string());
        }
    }

    let mut gate_response = GateResponse::new();
    let outcome = stage.process(&mut gate_request, &mut gate_response);

    let mut response = match outcome {
        Outcome::Halt => halted_response(&gate_response),
        Outcome::Continue => {
            let mut request = request;
            if let Some(principal) = gate_request.principal() {
                request.extensions_mut().insert(principal.clone());
            }
            let mut response = next.run(request).await;
            merge_headers(&gate_response, &mut response);
            response
        }
    };

    if let Some(session_id) = issue_session_cookie {
        let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

/// Build the stage's request view, buffering the login form body when needed.
async fn into_gate_request(request: Request) -> Result<(GateRequest, Request), StatusCode> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    // A TLS terminator in front of the demo server reports the original
    // scheme through x-forwarded-proto.
    let secure = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"));

    let mut gate_request = GateRequest::new(method.clone(), &path).with_secure(secure);
    for (name, value) in request.headers() {
        if let Ok(value) = value.to_str() {
            gate_request = gate_request.with_header(name.clone(), value);
        }
    }
    if let Some(session_id) = cookie_value(&gate_request, SESSION_COOKIE) {
        gate_request.set_session_id(session_id);
    }
    if let Some(query) = request.uri().query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            gate_request.set_param(key.into_owned(), value.into_owned());
        }
    }

    // The login submission carries credentials in the form body; buffer and
    // replay it so the inner service still sees the request intact.
    if method == Method::POST && path.ends_with(LOGIN_ACTION) && is_form(&request) {
        let (parts, body) = request.into_parts();
        let bytes = to_bytes(body, MAX_FORM_BYTES).await.map_err(|err| {
            error!("Failed to buffer login form: {err}");
            StatusCode::PAYLOAD_TOO_LARGE
        })?;
        for (key, value) in url::form_urlencoded::parse(&bytes) {
            gate_request.set_param(key.into_owned(), value.into_owned());
        }
        let request = Request::from_parts(parts, Body::from(bytes));
        return Ok((gate_request, request));
    }

    Ok((gate_request, request))
}

fn is_form(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

fn cookie_value(request: &GateRequest, name: &str) -> Option<String> {
    let header = request.headers().get(COOKIE)?.to_str().ok()?;
    for pair in header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();
        if key == name {
            return Some(value.to_string());
        }
    }
    None
}

fn halted_response(gate_response: &GateResponse) -> Response {
    let body = gate_response.body().unwrap_or_default().to_string();
    let mut response = (gate_response.status(), body).into_response();
    for (name, value) in gate_response.headers() {
        response.headers_mut().append(name.clone(), value.clone());
    }
    response
}

fn merge_headers(gate_response: &GateResponse, response: &mut Response) {
    for (name, value) in gate_response.headers() {
        if name == SET_COOKIE {
            response.headers_mut().append(name.clone(), value.clone());
        } else {
            response.headers_mut().insert(name.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn cookie_value_finds_named_cookie() {
        let request = GateRequest::new(Method::GET, "/")
            .with_header(COOKIE, "other=1; gardisto_session=abc123; more=2");
        assert_eq!(
            cookie_value(&request, SESSION_COOKIE),
            Some("abc123".to_string())
        );
        assert_eq!(cookie_value(&request, "missing"), None);
    }
}
