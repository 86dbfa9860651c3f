use async_trait::async_trait;

use crate::DamperError;

/// A string key-value store shared by every process instance.
///
/// Dispatchers keep their coordination timestamps here as decimal text under
/// namespaced keys. The store only needs last-write-wins semantics: all
/// mutations that affect a run/skip decision happen while the dispatcher
/// holds its distributed lock.
///
/// Backend failures should be surfaced as [`DamperError::Store`] (or
/// [`DamperError::Redis`] for the bundled Redis backend); they are passed
/// through to the `dispatch` caller without retries.
///
/// [`DamperError::Redis`]: crate::DamperError
#[async_trait]
pub trait TimestampStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, DamperError>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), DamperError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), DamperError>;
}
