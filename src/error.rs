use std::fmt;

/// Typed errors for channel, select, and generator operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A caller broke the single-party protocol: a second concurrent
    /// sender or receiver on a channel, a duplicate select registration,
    /// or a reentrant generator call.
    Misuse(&'static str),
    /// A coroutine body (or a promise it awaited) failed with a message.
    Failure(String),
    /// `next()` was called after the sequence ended.
    Exhausted,
}

impl Error {
    /// Shorthand for a [`Error::Failure`] carrying `msg`.
    pub fn failure(msg: impl Into<String>) -> Self {
        Error::Failure(msg.into())
    }

    /// The human-readable message behind this error.
    ///
    /// Bodies that catch an awaited failure typically inspect this.
    pub fn message(&self) -> &str {
        match self {
            Error::Misuse(msg) => msg,
            Error::Failure(msg) => msg,
            Error::Exhausted => "no such element",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Misuse(msg) => write!(f, "protocol misuse: {}", msg),
            Error::Failure(msg) => write!(f, "coroutine failure: {}", msg),
            Error::Exhausted => write!(f, "no such element"),
        }
    }
}

impl std::error::Error for Error {}
