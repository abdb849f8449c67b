//! Error types for the caching layer.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the caching layer.
///
/// The propagation rule is positional: failures that occur before a value has
/// been returned to the caller (miss-path failures) are surfaced; failures
/// that occur after a stale value has already been returned (refresh-path
/// failures) are absorbed and logged. Callers never observe a refresh failure
/// as an error; at worst they keep seeing stale data until a refresh lands.
#[derive(Debug, Clone)]
pub enum Error {
    /// An argument was outside the allowed shapes.
    ///
    /// Arguments are restricted to strings, numbers, booleans, arrays of
    /// those, and flat string-keyed objects of those. Raised at the
    /// `serde_json::Value` conversion boundary; fatal to that call.
    InvalidArgumentType(String),

    /// The external cache store is unavailable or returned an error.
    ///
    /// Fatal and surfaced: the layer cannot safely degrade silently when the
    /// store it was constructed with cannot be reached.
    BackendError(String),

    /// A stored entry did not match the expected shape (bad envelope, wrong
    /// kind, wrong schema version).
    ///
    /// Recovered locally: the read path treats it as a miss, logs a warning,
    /// and recomputes synchronously.
    MalformedCacheEntry(String),

    /// Serialization of a value, entry, or wire message failed.
    SerializationError(String),

    /// Deserialization of cached bytes or a wire message failed.
    ///
    /// On the read path this is recovered the same way as
    /// [`Error::MalformedCacheEntry`].
    DeserializationError(String),

    /// The out-of-band revalidation request could not be sent.
    ///
    /// Caught and logged by the dispatching task; never surfaced to the
    /// original caller, who already received the stale value.
    DispatchFailure(String),

    /// The underlying computation failed.
    ///
    /// Surfaced on the miss path (the caller is waiting); logged at the
    /// executor boundary on the refresh path (nobody is waiting by design).
    ComputeFailure(String),

    /// No computation is registered under the requested function identity.
    UnknownFunction(String),

    /// Invalid configuration, e.g. a zero revalidation window.
    ConfigError(String),

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgumentType(msg) => write!(f, "Invalid argument type: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::MalformedCacheEntry(msg) => write!(f, "Malformed cache entry: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::DispatchFailure(msg) => write!(f, "Dispatch failure: {}", msg),
            Error::ComputeFailure(msg) => write!(f, "Compute failure: {}", msg),
            Error::UnknownFunction(id) => write!(f, "Unknown function: {}", id),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::DispatchFailure(e.to_string())
    }
}
