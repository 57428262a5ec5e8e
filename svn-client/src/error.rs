use thiserror::Error;

/// Failures surfaced by a remote session. A concrete [`RaSession`](crate::RaSession)
/// implementation maps whatever its underlying transport produces (network
/// errors, authentication failures, malformed responses) onto these.
#[derive(Debug, Error)]
pub enum Error {
    #[error("path {path:?} not found at revision {revision}")]
    NotFound { path: String, revision: u64 },

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    /// A `DeltaConsumer` implementation's own error, surfaced through the
    /// shared return type the editor callback trait is fixed to. The
    /// consumer crate's richer error is preserved only as text; callers
    /// that need the original variant keep it on their own side of the
    /// call (see `delta-driver::Error`).
    #[error("{0}")]
    Consumer(String),
}
