use thiserror::Error;

/// Failure reported by an individual store.
///
/// The aggregator never inspects or rewrites these: a failing `get`/`set` on a
/// [`MultiStore`](crate::MultiStore) hands back one of the underlying errors
/// unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Store call aborted: {0}")]
    Aborted(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Raised when a [`MultiStore`](crate::MultiStore) cannot be constructed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one store required")]
    NoStores,
}
