use causerie_shared::RequestError;
use thiserror::Error;

/// Errors produced by the networking layer.
#[derive(Error, Debug)]
pub enum NetError {
    /// The backend answered with a non-success status.
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// The request could not complete within the bounded timeout.
    #[error("Backend unavailable: request timed out")]
    Unavailable,

    /// Transport-level HTTP failure (connection refused, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// WebSocket-level failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A response body failed to decode.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading or writing the credential file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,
}

impl From<reqwest::Error> for NetError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetError::Unavailable
        } else {
            NetError::Http(err)
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NetError>;
