//! Session-backed identity cache.
//!
//! A session stores the authentication record established by a login so later
//! requests in the same session skip re-authentication. Ancillary credentials
//! travel in a note-style key/value store next to the record.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

use super::request::{AuthenticationRecord, GateRequest, Principal};

#[derive(Debug, Default)]
struct SessionState {
    auth_type: Option<String>,
    principal: Option<Principal>,
    notes: HashMap<String, String>,
}

/// One client session, safe for concurrent use.
#[derive(Debug)]
pub struct Session {
    id: String,
    state: RwLock<SessionState>,
}

impl Session {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: RwLock::new(SessionState::default()),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Cached authentication record, present once both the type tag and the
    /// principal have been stored.
    #[must_use]
    pub fn auth(&self) -> Option<AuthenticationRecord> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match (&state.auth_type, &state.principal) {
            (Some(auth_type), Some(principal)) => {
                Some(AuthenticationRecord::new(auth_type, principal.clone()))
            }
            _ => None,
        }
    }

    pub fn set_auth(&self, auth_type: &str, principal: Principal) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.auth_type = Some(auth_type.to_string());
        state.principal = Some(principal);
    }

    #[must_use]
    pub fn note(&self, key: &str) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.notes.get(key).cloned()
    }

    pub fn set_note(&self, key: &str, value: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.notes.insert(key.to_string(), value.to_string());
    }

    pub fn remove_note(&self, key: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.notes.remove(key);
    }
}

/// Per-session identity storage looked up by the pipeline.
pub trait SessionStore: Send + Sync {
    /// Resolve the session the request belongs to.
    ///
    /// With `create` false this never allocates a session; the stage itself
    /// only ever looks up, creation is the surrounding server's business.
    fn find(&self, request: &GateRequest, create: bool) -> Option<Arc<Session>>;
}

/// In-memory session store for tests and the demo server.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh session with a random identifier.
    pub fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(Uuid::new_v4().simple().to_string()));
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session.id().to_string(), Arc::clone(&session));
        session
    }
}

impl SessionStore for MemorySessionStore {
    fn find(&self, request: &GateRequest, create: bool) -> Option<Arc<Session>> {
        let existing = request.session_id().and_then(|id| {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            sessions.get(id).cloned()
        });
        match existing {
            Some(session) => Some(session),
            None if create => Some(self.create()),
            None => None,
        }
    }
}
