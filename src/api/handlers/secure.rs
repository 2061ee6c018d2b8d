use axum::{extract::Extension, response::IntoResponse};

use crate::gate::Principal;

// axum handler for the protected area; the principal arrives as a request
// extension set by the access-control middleware
pub async fn secure(principal: Option<Extension<Principal>>) -> impl IntoResponse {
    match principal {
        Some(Extension(principal)) => format!("hello {}", principal.name()),
        None => "hello anonymous".to_string(),
    }
}
