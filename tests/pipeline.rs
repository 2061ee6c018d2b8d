//! End-to-end exercises of the access-control stage against an in-memory
//! realm, session store, and single sign-on registry. No network involved;
//! requests and responses are driven directly through the stage.

use axum::http::{
    header::{CACHE_CONTROL, EXPIRES, HOST, LOCATION, PRAGMA},
    Method, StatusCode,
};
use std::sync::Arc;

use gardisto::gate::{
    scheme::{FormScheme, LoginConfig, FORM_AUTH, FORM_PASSWORD, FORM_USERNAME, LOGIN_ACTION},
    AccessControlStage, GateRequest, GateResponse, MemoryRealm, MemorySessionStore,
    MemorySsoRegistry, Outcome, SecurityConstraint, SsoRegistry, StageConfig,
};

fn form_stage(
    config: StageConfig,
    realm: MemoryRealm,
    sessions: Arc<MemorySessionStore>,
    sso: Option<Arc<MemorySsoRegistry>>,
) -> AccessControlStage {
    let login = LoginConfig::new(FORM_AUTH)
        .with_login_page("/login.html")
        .with_error_page("/login-error.html");

    let mut stage = AccessControlStage::new(
        config,
        login,
        Arc::new(realm),
        sessions,
        Arc::new(FormScheme),
    )
    .unwrap();

    if let Some(sso) = sso {
        stage = stage.with_sso(sso);
    }

    stage.start().unwrap();
    stage
}

fn orders_realm() -> MemoryRealm {
    MemoryRealm::new("Orders")
        .with_user(
            "alice",
            "secret",
            vec!["user".to_string(), "admin".to_string()],
        )
        .with_constraint(SecurityConstraint::new("/secure/*").with_roles(vec!["user".to_string()]))
}

#[test]
fn form_login_establishes_session_and_sso() {
    let sessions = Arc::new(MemorySessionStore::new());
    let sso = Arc::new(MemorySsoRegistry::new());
    let stage = form_stage(
        StageConfig::new(),
        orders_realm(),
        Arc::clone(&sessions),
        Some(Arc::clone(&sso)),
    );

    let session = sessions.create();

    let mut request = GateRequest::new(Method::POST, format!("/app{LOGIN_ACTION}"))
        .with_context_path("/app")
        .with_session_id(session.id())
        .with_param(FORM_USERNAME, "alice")
        .with_param(FORM_PASSWORD, "secret");
    let mut response = GateResponse::new();

    assert_eq!(stage.process(&mut request, &mut response), Outcome::Continue);

    // Identity is on the request and cached in the session.
    let record = request.auth().expect("request should carry an identity");
    assert_eq!(record.auth_type(), FORM_AUTH);
    assert_eq!(record.principal().name(), "alice");

    let cached = session.auth().expect("session should cache the identity");
    assert_eq!(cached.auth_type(), FORM_AUTH);
    assert_eq!(cached.principal().name(), "alice");

    // The login propagated into the registry under a digest-derived token.
    assert_eq!(sso.len(), 1);
    let cookies = response.cookies();
    let token = cookies
        .iter()
        .find_map(|cookie| cookie.strip_prefix("gardisto_sso="))
        .and_then(|rest| rest.split(';').next())
        .expect("response should set the sso cookie");
    assert_eq!(token.len(), 32);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

    let entry = sso.lookup(token).expect("token should resolve");
    assert_eq!(entry.principal.name(), "alice");
    assert_eq!(entry.auth_type, FORM_AUTH);
    assert_eq!(entry.username.as_deref(), Some("alice"));
    assert_eq!(entry.password.as_deref(), Some("secret"));
    assert_eq!(entry.realm_name, "Orders");
}

#[test]
fn cached_identity_admits_later_protected_request() {
    let sessions = Arc::new(MemorySessionStore::new());
    let stage = form_stage(
        StageConfig::new(),
        orders_realm(),
        Arc::clone(&sessions),
        None,
    );

    let session = sessions.create();

    let mut login = GateRequest::new(Method::POST, LOGIN_ACTION)
        .with_session_id(session.id())
        .with_param(FORM_USERNAME, "alice")
        .with_param(FORM_PASSWORD, "secret");
    let mut response = GateResponse::new();
    assert_eq!(stage.process(&mut login, &mut response), Outcome::Continue);

    // A later request in the same session reaches the protected area without
    // resubmitting credentials.
    let mut request =
        GateRequest::new(Method::GET, "/secure/orders").with_session_id(session.id());
    let mut response = GateResponse::new();
    assert_eq!(stage.process(&mut request, &mut response), Outcome::Continue);
    assert_eq!(
        request.principal().map(|principal| principal.name()),
        Some("alice")
    );
}

#[test]
fn failed_login_halts_without_cache_headers() {
    let sessions = Arc::new(MemorySessionStore::new());
    let stage = form_stage(
        StageConfig::new(),
        orders_realm(),
        Arc::clone(&sessions),
        None,
    );

    let session = sessions.create();

    let mut request = GateRequest::new(Method::POST, LOGIN_ACTION)
        .with_session_id(session.id())
        .with_param(FORM_USERNAME, "alice")
        .with_param(FORM_PASSWORD, "wrong");
    let mut response = GateResponse::new();

    assert_eq!(stage.process(&mut request, &mut response), Outcome::Halt);
    assert!(request.principal().is_none());
    assert!(session.auth().is_none());

    // Bad credentials bounce to the error page.
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.header(&LOCATION), Some("/login-error.html"));

    // Cache suppression only applies once a constraint matched.
    assert!(response.header(&PRAGMA).is_none());
    assert!(response.header(&CACHE_CONTROL).is_none());
    assert!(response.header(&EXPIRES).is_none());
}

#[test]
fn confidential_constraint_redirects_insecure_request() {
    let realm = MemoryRealm::new("Orders").with_constraint(
        SecurityConstraint::new("/secure/*").with_confidentiality(),
    );
    let sessions = Arc::new(MemorySessionStore::new());
    let stage = form_stage(StageConfig::new(), realm, Arc::clone(&sessions), None);

    let mut request = GateRequest::new(Method::GET, "/secure/orders")
        .with_header(HOST, "shop.example.com:8080");
    let mut response = GateResponse::new();

    assert_eq!(stage.process(&mut request, &mut response), Outcome::Halt);
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.header(&LOCATION),
        Some("https://shop.example.com/secure/orders")
    );

    // The insecure GET against a constrained resource picked up the
    // cache-suppression trio.
    assert_eq!(response.header(&PRAGMA), Some("No-cache"));
    assert_eq!(response.header(&CACHE_CONTROL), Some("no-cache"));
    assert_eq!(
        response.header(&EXPIRES),
        Some("Thu, 01 Jan 1970 00:00:00 GMT")
    );
}

#[test]
fn unauthorized_role_is_denied() {
    let realm = MemoryRealm::new("Orders")
        .with_user("mallory", "secret", vec!["guest".to_string()])
        .with_constraint(
            SecurityConstraint::new("/secure/*").with_roles(vec!["admin".to_string()]),
        );
    let sessions = Arc::new(MemorySessionStore::new());
    let stage = form_stage(StageConfig::new(), realm, Arc::clone(&sessions), None);

    let session = sessions.create();

    let mut login = GateRequest::new(Method::POST, LOGIN_ACTION)
        .with_session_id(session.id())
        .with_param(FORM_USERNAME, "mallory")
        .with_param(FORM_PASSWORD, "secret");
    let mut response = GateResponse::new();
    assert_eq!(stage.process(&mut login, &mut response), Outcome::Continue);

    // Authenticated but not authorized.
    let mut request =
        GateRequest::new(Method::GET, "/secure/orders").with_session_id(session.id());
    let mut response = GateResponse::new();
    assert_eq!(stage.process(&mut request, &mut response), Outcome::Halt);
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
