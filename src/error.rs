use thiserror::Error;

use crate::collaborators::CollaboratorError;

/// Convenience result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Fixed classification of transport-level failures.
///
/// Each kind renders a fixed, human-readable message; the underlying transport error is logged
/// but never surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// TLS handshake or certificate validation failed.
    Tls,
    /// Timed out while establishing the connection.
    ConnectTimeout,
    /// Connected, but no data arrived in time.
    ReadTimeout,
    /// Any other connection failure (DNS, refused, reset).
    Connection,
}

impl TransportFailure {
    pub fn message(self) -> &'static str {
        match self {
            Self::Tls => "SSL certificate validation failed",
            Self::ConnectTimeout => "The request timed out while trying to connect to the server",
            Self::ReadTimeout => "The server did not send any data in the allotted amount of time",
            Self::Connection => "Invalid endpoint or credentials",
        }
    }
}

impl std::fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Error type returned by every public feed operation.
///
/// Internal failures (I/O, CSV decoding, JSON decoding, collaborator errors) are folded into
/// [`FeedError::Unclassified`] so callers only ever see this taxonomy.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The configured input mode does not support the requested operation.
    #[error("{0}")]
    Configuration(String),

    /// The HTTP transport failed before a response was received.
    #[error("{0}")]
    Transport(TransportFailure),

    /// The remote server answered with a non-success status.
    #[error("remote API error (status {status}): {body}")]
    RemoteApi {
        status: u16,
        body: serde_json::Value,
    },

    /// An attachment or file reference could not be resolved.
    #[error("Requested resource could not be found with input type \"{input_mode}\" and value \"{value}\"")]
    ResourceNotFound { input_mode: String, value: String },

    /// A File IRI does not follow the `/api/3/files/` convention.
    #[error("Invalid File IRI {0}")]
    InvalidReference(String),

    /// An optional collaborator required by this operation was not provided.
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Anything else, carrying the original message.
    #[error("{0}")]
    Unclassified(String),
}

impl FeedError {
    pub(crate) fn unclassified(message: impl Into<String>) -> Self {
        Self::Unclassified(message.into())
    }
}

impl From<std::io::Error> for FeedError {
    fn from(err: std::io::Error) -> Self {
        Self::Unclassified(err.to_string())
    }
}

impl From<csv::Error> for FeedError {
    fn from(err: csv::Error) -> Self {
        Self::Unclassified(err.to_string())
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unclassified(err.to_string())
    }
}

impl From<CollaboratorError> for FeedError {
    fn from(err: CollaboratorError) -> Self {
        Self::Unclassified(err.to_string())
    }
}
