use thiserror::Error;

/// Failures surfaced by the access-control stage.
///
/// Policy denials are not errors; they are the `Halt` outcome of `process`.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("stage already started")]
    AlreadyStarted,
    #[error("stage not started")]
    NotStarted,
    #[error("no realm name available while registering an authentication")]
    MissingRealmName,
    #[error("message digest algorithm {0:?} is not available")]
    DigestUnavailable(String),
}
