//! Router-level tests driving the axum middleware adapter with `oneshot`
//! requests, Basic authentication in front of the protected area.

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{AUTHORIZATION, SET_COOKIE, WWW_AUTHENTICATE},
        Request, StatusCode,
    },
};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;
use tower::ServiceExt;

use gardisto::api::{self, SESSION_COOKIE};
use gardisto::gate::{
    scheme::{BasicScheme, LoginConfig, BASIC_AUTH},
    AccessControlStage, MemoryRealm, MemorySessionStore, SecurityConstraint, StageConfig,
};

fn stage() -> Arc<AccessControlStage> {
    let realm = MemoryRealm::new("Gardisto")
        .with_user("alice", "secret", vec!["user".to_string()])
        .with_constraint(
            SecurityConstraint::new("/secure/*").with_roles(vec!["user".to_string()]),
        );

    let stage = AccessControlStage::new(
        StageConfig::new(),
        LoginConfig::new(BASIC_AUTH),
        Arc::new(realm),
        Arc::new(MemorySessionStore::new()),
        Arc::new(BasicScheme),
    )
    .unwrap();
    stage.start().unwrap();
    Arc::new(stage)
}

#[tokio::test]
async fn unprotected_route_passes_through() {
    let app = api::router(stage());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_route_challenges_anonymous_caller() {
    let app = api::router(stage());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/secure/area")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok()),
        Some("Basic realm=\"Gardisto\"")
    );

    // A session cookie is issued even on the challenge.
    let cookies: Vec<&str> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    assert!(cookies
        .iter()
        .any(|cookie| cookie.starts_with(SESSION_COOKIE)));
}

#[tokio::test]
async fn protected_route_admits_valid_credentials() {
    let app = api::router(stage());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/secure/area")
                .header(
                    AUTHORIZATION,
                    format!("Basic {}", STANDARD.encode("alice:secret")),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"hello alice");
}

#[tokio::test]
async fn protected_route_rejects_bad_credentials() {
    let app = api::router(stage());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/secure/area")
                .header(
                    AUTHORIZATION,
                    format!("Basic {}", STANDARD.encode("alice:wrong")),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
