//! Authorization decision observers.

use anyhow::Result;
use tracing::info;

use super::request::GateRequest;

/// Observer notified of every authorization decision.
///
/// A failing notification on the denial path is logged and ignored; on the
/// grant path it converts the decision into a denial (see the stage docs).
pub trait AuditSink: Send + Sync {
    /// Record a decision for the given request.
    ///
    /// # Errors
    /// Implementations may fail; the stage decides what a failure means based
    /// on which path it happened on.
    fn notify(&self, request: &GateRequest, granted: bool) -> Result<()>;
}

/// Sink that logs decisions through `tracing`.
#[derive(Clone, Debug, Default)]
pub struct TraceAuditSink;

impl AuditSink for TraceAuditSink {
    fn notify(&self, request: &GateRequest, granted: bool) -> Result<()> {
        info!(
            method = %request.method(),
            path = request.path(),
            principal = request.principal().map(super::request::Principal::name),
            granted,
            "authorization decision"
        );
        Ok(())
    }
}
