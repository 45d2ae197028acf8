//! Error types for store operations.

use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by stores and the fetch coordinator.
///
/// Store-layer errors are returned directly to the caller, never retried
/// and never wrapped with additional context. The fetch path is the one
/// exception: a failed `read` is swallowed and treated as a miss (see
/// [`crate::CacheFetcher::fetch`]).
#[derive(Debug)]
pub enum Error {
    /// The backing store rejected or failed a command (connection loss,
    /// pool exhaustion, server-side error).
    BackendError(String),

    /// A value could not be serialized for storage.
    SerializationError(String),

    /// A stored value could not be decoded into the requested type.
    DeserializationError(String),

    /// Backend configuration is invalid or incomplete.
    ConfigError(String),

    /// A command was issued against a key holding a different kind of
    /// value (the Redis WRONGTYPE condition).
    WrongTypeError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "backend error: {}", msg),
            Error::SerializationError(msg) => write!(f, "serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "deserialization error: {}", msg),
            Error::ConfigError(msg) => write!(f, "config error: {}", msg),
            Error::WrongTypeError(msg) => write!(f, "wrong type: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
