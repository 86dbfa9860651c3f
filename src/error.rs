/// Boxed error type carried by store, lock, and action failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for this crate.
#[derive(Debug, thiserror::Error)]
pub enum DamperError {
    /// Redis error.
    #[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Store backend failure.
    #[error("store backend error: {0}")]
    Store(BoxError),

    /// Lock backend failure.
    #[error("lock backend error: {0}")]
    Lock(BoxError),

    /// The dispatched action ran and returned an error.
    #[error("dispatched action failed: {0}")]
    Action(BoxError),

    /// Invalid dispatcher id.
    #[error("invalid dispatcher id: {0}")]
    InvalidDispatcherId(String),

    /// Invalid key prefix.
    #[error("invalid key prefix: {0}")]
    InvalidKeyPrefix(String),
}
