//! Error types for the key-value client

use thiserror::Error;

/// Errors that can occur when talking to the key-value store
#[derive(Error, Debug)]
pub enum Error {
    /// No database URL was given and the environment variable is unset
    #[error("missing database URL: pass one to Client::new or set the KVDB_URL environment variable")]
    MissingUrl,

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Key normalization left nothing behind
    #[error("cannot use an empty key")]
    EmptyKey,

    /// The credential provider failed to produce a token
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Key was not found
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Server returned a non-success status
    #[error("Server error (status {status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body text
        message: String,
    },

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A response contained bytes that were not valid UTF-8 or valid
    /// percent-encoding
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;
