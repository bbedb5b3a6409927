//! Error types for the blob storage client.

use thiserror::Error;

/// Errors surfaced by credentials and the blob service client.
///
/// Messages never contain the bearer token; transport errors are sanitized before they are
/// stored here.
#[derive(Error, Debug)]
pub enum BlobStorageError {
    /// The storage account name or endpoint template is unusable.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connect/timeout/body read failures.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("storage service returned {status}{}", .code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Status {
        status: u16,
        /// `x-ms-error-code` (or the `<Code>` element of the error body), if present.
        code: Option<String>,
    },

    /// The listing body could not be understood.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, BlobStorageError>;

impl From<reqwest::Error> for BlobStorageError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(crate::endpoint::sanitize_reqwest_error(&value))
    }
}
