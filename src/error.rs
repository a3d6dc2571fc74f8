//! Error types for estat

use thiserror::Error;

/// Main error type for estat operations
#[derive(Debug, Error)]
pub enum EstatError {
    /// A remote retrieval failed; carries the attempted URL
    #[error("{source}: {url}")]
    Fetch {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The HTTP client could not be built; no request was attempted
    #[error("{0}")]
    ClientError(#[source] TransportError),

    #[error("Malformed dataset text: {0}")]
    MalformedText(String),

    #[error("Failed to parse dataset: {0}")]
    ParseError(String),

    #[error("Axis error: {0}")]
    AxisError(String),

    #[error("Cache entry {path} is unreadable: {reason}")]
    CacheError { path: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Failures below the URL level: network, status, payload decoding
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("Failed to decompress payload: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("Payload is not valid UTF-8")]
    Encoding,
}

impl TransportError {
    /// HTTP status code, if the remote answered with one
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

/// Result type alias for estat operations
pub type EstatResult<T> = Result<T, EstatError>;
