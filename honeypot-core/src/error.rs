use std::fmt;

/// Outcome of driving one session's [`crate::session::SessionContext`] through
/// its protocol dialog.
///
/// Every dialog boundary collapses parse failures, short reads, timeouts and
/// classification mishaps into one of these variants instead of propagating
/// an exception. The supervisor's response is identical for all of them (log
/// and close the session) — the taxonomy exists so tests can assert on *why*
/// a session ended, per the design note about splitting the original
/// broad-catch control flow.
#[derive(thiserror::Error, Debug)]
pub enum DialogError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("short read")]
    ShortRead,

    #[error("inactivity deadline exceeded")]
    Timeout,

    #[error("classification failed: {0}")]
    ClassifyFailure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DialogError {
    /// True for failures that should also trigger a ban, per the SSH dialog
    /// (`parse failure after the first attempt` -> close and ban).
    pub fn is_fatal_for_peer(&self) -> bool {
        matches!(
            self,
            DialogError::MalformedFrame(_) | DialogError::ClassifyFailure(_)
        )
    }
}

/// Top-level error for listener setup (bind, config) — these are the only
/// errors allowed to terminate a listener per spec (§7 "Fatal").
#[derive(thiserror::Error, Debug)]
pub enum ListenerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("accept loop failed: {0}")]
    Accept(#[source] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl fmt::Display for DialogOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogOutcome::Closed => write!(f, "closed"),
            DialogOutcome::Banned => write!(f, "banned"),
            DialogOutcome::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// How a session's dialog ended. `ListenerSupervisor` logs a
/// `connection_closed` event regardless of which of these was returned —
/// this only affects what gets logged alongside it.
#[derive(Debug)]
pub enum DialogOutcome {
    Closed,
    Banned,
    Error(DialogError),
}
