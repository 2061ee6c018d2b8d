//! Access-control pipeline stage.
//!
//! For every inbound request the stage decides whether the targeted resource
//! is protected, restores any previously-established identity from the
//! session, triggers the configured authentication scheme when a constraint
//! demands it, enforces transport-confidentiality and resource-authorization
//! policy through the realm, and propagates the verified identity downstream
//! and into an optional single-sign-on registry.
//!
//! The stage is synchronous: one logical thread of control per in-flight
//! request, every step blocking with respect to the caller. Shared mutable
//! state is confined to the stage instance (the token generator's mutex, the
//! active-SSO reference, the started flag); collaborators are expected to be
//! safe for concurrent use on their own.

use axum::http::{
    header::{CACHE_CONTROL, EXPIRES, PRAGMA},
    Method,
};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, error, info, warn};

pub mod audit;
pub mod config;
pub mod constraint;
pub mod error;
pub mod realm;
pub mod request;
pub mod scheme;
pub mod session;
pub mod sso;
pub mod token;

pub use audit::{AuditSink, TraceAuditSink};
pub use config::StageConfig;
pub use constraint::SecurityConstraint;
pub use error::GateError;
pub use realm::{MemoryRealm, Realm};
pub use request::{AuthenticationRecord, GateRequest, GateResponse, Principal};
pub use scheme::{AuthScheme, BasicScheme, FormScheme, LoginConfig};
pub use session::{MemorySessionStore, Session, SessionStore};
pub use sso::{MemorySsoRegistry, SsoEntry, SsoRegistry, SSO_COOKIE};
pub use token::TokenGenerator;

/// `Expires` value pinned to the oldest representable HTTP date, fixed for
/// the process lifetime.
const DATE_ONE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Session note holding the username used to authenticate.
pub const USERNAME_NOTE: &str = "gardisto.auth.username";

/// Session note holding the password used to authenticate.
pub const PASSWORD_NOTE: &str = "gardisto.auth.password";

/// Request note holding the SSO token issued for this authentication.
pub const SSO_ID_NOTE: &str = "gardisto.auth.sso";

/// What the pipeline should do after this stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Pass control to the next stage.
    Continue,
    /// A challenge, redirect, or error has been written; stop processing.
    Halt,
}

/// The pipeline stage enforcing declared security constraints.
pub struct AccessControlStage {
    config: StageConfig,
    login: LoginConfig,
    realm: Arc<dyn Realm>,
    sessions: Arc<dyn SessionStore>,
    scheme: Arc<dyn AuthScheme>,
    sso: Option<Arc<dyn SsoRegistry>>,
    active_sso: RwLock<Option<Arc<dyn SsoRegistry>>>,
    audit_sinks: Vec<Arc<dyn AuditSink>>,
    tokens: TokenGenerator,
    started: Mutex<bool>,
}

impl AccessControlStage {
    /// Assemble a stage from its collaborators.
    ///
    /// The token digest and random source are built eagerly here, so a
    /// misconfigured digest surfaces at construction rather than at first
    /// token generation.
    ///
    /// # Errors
    /// Returns [`GateError::DigestUnavailable`] when no digest algorithm
    /// resolves.
    pub fn new(
        config: StageConfig,
        login: LoginConfig,
        realm: Arc<dyn Realm>,
        sessions: Arc<dyn SessionStore>,
        scheme: Arc<dyn AuthScheme>,
    ) -> Result<Self, GateError> {
        // Weak but deterministic fallback when no entropy is configured.
        let entropy = config.entropy().map_or_else(
            || format!("{}:{}", env!("CARGO_PKG_NAME"), std::process::id()),
            str::to_string,
        );
        let tokens = TokenGenerator::new(config.algorithm(), config.random_source(), &entropy)?;
        Ok(Self {
            config,
            login,
            realm,
            sessions,
            scheme,
            sso: None,
            active_sso: RwLock::new(None),
            audit_sinks: Vec::new(),
            tokens,
            started: Mutex::new(false),
        })
    }

    /// Inject the SSO registry this stage should cooperate with.
    ///
    /// Absence is legal; SSO propagation then degrades to a no-op.
    #[must_use]
    pub fn with_sso(mut self, sso: Arc<dyn SsoRegistry>) -> Self {
        self.sso = Some(sso);
        self
    }

    /// Add an observer notified of every authorization decision.
    #[must_use]
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sinks.push(sink);
        self
    }

    #[must_use]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    #[must_use]
    pub fn login(&self) -> &LoginConfig {
        &self.login
    }

    #[must_use]
    pub fn realm(&self) -> &dyn Realm {
        self.realm.as_ref()
    }

    #[must_use]
    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        *self.started.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin active use of the stage.
    ///
    /// # Errors
    /// Returns [`GateError::AlreadyStarted`] on a second start; the failed
    /// call leaves the started state untouched.
    pub fn start(&self) -> Result<(), GateError> {
        let mut started = self.started.lock().unwrap_or_else(PoisonError::into_inner);
        if *started {
            return Err(GateError::AlreadyStarted);
        }
        *started = true;

        let mut active = self
            .active_sso
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        active.clone_from(&self.sso);
        if active.is_some() {
            info!("Single sign-on registry attached");
        } else {
            debug!("No single sign-on registry configured");
        }
        Ok(())
    }

    /// Terminate active use of the stage and release the SSO reference.
    ///
    /// # Errors
    /// Returns [`GateError::NotStarted`] when the stage is not running.
    pub fn stop(&self) -> Result<(), GateError> {
        let mut started = self.started.lock().unwrap_or_else(PoisonError::into_inner);
        if !*started {
            return Err(GateError::NotStarted);
        }
        *started = false;

        let mut active = self
            .active_sso
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *active = None;
        Ok(())
    }

    fn active_sso(&self) -> Option<Arc<dyn SsoRegistry>> {
        self.active_sso
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Enforce the security constraints declared for this request.
    ///
    /// Each step may halt the pipeline; whoever detected the failure has
    /// already written the challenge, redirect, or error into the response.
    pub fn process(&self, request: &mut GateRequest, response: &mut GateResponse) -> Outcome {
        debug!(
            method = %request.method(),
            path = request.path(),
            "security checking request"
        );

        // Restore a cached identity so one login spans the whole session.
        if self.config.cache() && request.principal().is_none() {
            if let Some(session) = self.sessions.find(request, false) {
                if let Some(record) = session.auth() {
                    debug!(
                        auth_type = record.auth_type(),
                        principal = record.principal().name(),
                        "restoring cached identity"
                    );
                    request.set_auth(record);
                }
            }
        }

        // The login form itself may sit outside the protected area, so the
        // submission action authenticates before any constraint is known.
        if request.context_relative_path() == scheme::LOGIN_ACTION
            && !self.invoke_scheme(request, response)
        {
            debug!(path = request.path(), "login action failed to authenticate");
            return Outcome::Halt;
        }

        let Some(constraints) = self.realm.find_constraints(request) else {
            debug!(path = request.path(), "not subject to any constraint");
            return Outcome::Continue;
        };

        // Keep protected responses out of intermediary caches.
        if self.config.disable_proxy_caching()
            && !request.secure()
            && request.method() != Method::POST
        {
            response.set_header(PRAGMA, "No-cache");
            response.set_header(CACHE_CONTROL, "no-cache");
            response.set_header(EXPIRES, DATE_ONE);
        }

        if !self
            .realm
            .check_confidentiality(request, response, &constraints)
        {
            debug!(path = request.path(), "failed confidentiality check");
            return Outcome::Halt;
        }

        // Authenticate once for the first constraint that demands it. An
        // identity restored from the session already satisfies the demand.
        for constraint in &constraints {
            if constraint.requires_auth() {
                if request.principal().is_none() && !self.invoke_scheme(request, response) {
                    debug!(path = request.path(), "failed to authenticate");
                    return Outcome::Halt;
                }
                break;
            }
        }

        if !self
            .realm
            .check_resource_authorization(request, response, &constraints)
        {
            self.notify_denied(request);
            return Outcome::Halt;
        }

        if !self.notify_granted(request) {
            // A sink failure on the grant path blocks access even though
            // authorization itself succeeded. Deliberate, if surprising;
            // flagged for review in DESIGN.md.
            return Outcome::Halt;
        }

        debug!(path = request.path(), "passed all security constraints");
        Outcome::Continue
    }

    fn invoke_scheme(&self, request: &mut GateRequest, response: &mut GateResponse) -> bool {
        let scheme = Arc::clone(&self.scheme);
        scheme.authenticate(self, request, response, &self.login)
    }

    fn notify_denied(&self, request: &GateRequest) {
        for sink in &self.audit_sinks {
            if let Err(err) = sink.notify(request, false) {
                // The decision is already a denial; a failing observer
                // cannot change it.
                warn!("Audit sink failed on denial: {err}");
            }
        }
    }

    fn notify_granted(&self, request: &GateRequest) -> bool {
        let mut success = true;
        for sink in &self.audit_sinks {
            if let Err(err) = sink.notify(request, true) {
                error!("Audit sink failed on grant: {err}");
                success = false;
            }
        }
        success
    }

    /// Record a verified authentication on the request, in the session, and
    /// with the SSO registry.
    ///
    /// Called by a concrete [`AuthScheme`] after it has independently
    /// verified the credentials.
    ///
    /// # Errors
    /// Returns [`GateError::MissingRealmName`] when the realm reports no name
    /// at registration time. An authentication just succeeded under some
    /// realm, so this is a contract violation, not a recoverable state.
    pub fn register(
        &self,
        request: &mut GateRequest,
        response: &mut GateResponse,
        principal: Principal,
        auth_type: &str,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<(), GateError> {
        debug!(
            principal = principal.name(),
            auth_type, "registering authenticated principal"
        );

        request.set_auth(AuthenticationRecord::new(auth_type, principal.clone()));

        if self.config.cache() {
            if let Some(session) = self.sessions.find(request, false) {
                session.set_auth(auth_type, principal.clone());
                match username.as_deref() {
                    Some(value) => session.set_note(USERNAME_NOTE, value),
                    None => session.remove_note(USERNAME_NOTE),
                }
                match password.as_deref() {
                    Some(value) => session.set_note(PASSWORD_NOTE, value),
                    None => session.remove_note(PASSWORD_NOTE),
                }
            }
        }

        let Some(sso) = self.active_sso() else {
            return Ok(());
        };

        let token = self.tokens.generate();
        response.add_cookie(SSO_COOKIE, &token, "/", None);

        let realm_name = self
            .realm
            .realm_name()
            .map(str::to_string)
            .ok_or(GateError::MissingRealmName)?;
        sso.register(
            &token,
            SsoEntry {
                principal,
                auth_type: auth_type.to_string(),
                username,
                password,
                realm_name,
            },
        );
        request.set_note(SSO_ID_NOTE, &token);
        Ok(())
    }
}
