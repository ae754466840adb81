use thiserror::Error;

/// Failures the session can produce. All of them are absorbed at the
/// orchestrator boundary and converted to notifications; none of them is
/// allowed to escape the façade.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Contract violation on the queue store. Should never happen from valid
    /// orchestrator logic; debug builds assert, release builds clamp.
    #[error("index {index} out of range (queue length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Back navigation requested with only the root frame left.
    #[error("navigation stack is already at the root")]
    StackUnderflow,

    /// The resolver could not produce a playable URL.
    #[error("could not resolve online source for {key}: {message}")]
    ResolutionFailed { key: String, message: String },

    /// Local file missing or unreadable at play time.
    #[error("media unavailable: {0}")]
    MediaUnavailable(String),

    /// A library rescan pass failed; the previous snapshot stays authoritative.
    #[error("library rescan failed: {0}")]
    RescanFailed(String),
}
