use thiserror::Error;

use causerie_net::NetError;
use causerie_store::StoreError;

/// Errors surfaced by the wiring layer.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Net(#[from] NetError),

    #[error("Cache error: {0}")]
    Store(#[from] StoreError),

    /// The room feed closed before or while the session needed it.
    #[error("Room feed closed: {0}")]
    FeedClosed(String),

    /// The room feed did not reach `Open` within the bounded wait.
    #[error("Room feed did not open in time")]
    FeedTimeout,

    /// A shared-state lock was poisoned by a panicking task.
    #[error("State lock poisoned")]
    Poisoned,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
