use thiserror::Error;

/// Errors produced by the cache layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The entity is not present in the cache.
    #[error("Record not found in cache")]
    NotFound,

    /// The collection has not been fetched yet, which is not the same
    /// thing as being empty.
    #[error("Collection not loaded")]
    NotLoaded,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
