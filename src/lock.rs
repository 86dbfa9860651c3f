use std::time::Duration;

use async_trait::async_trait;

use crate::DamperError;

/// Exclusive, time-bounded ownership of a coordination key.
///
/// Obtained from a [`DistributedLockFactory`]. Release explicitly with
/// [`release`](DistributedLock::release); a lock that is dropped or whose
/// holder crashes is reclaimed by the backend once its expiry elapses.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Release the lock before its expiry.
    ///
    /// Implementations must be fenced: releasing a lock whose expiry already
    /// passed and whose key has been re-acquired by another process must not
    /// evict the new holder.
    async fn release(self: Box<Self>) -> Result<(), DamperError>;
}

/// Factory for distributed locks over a backing store shared by all
/// processes.
///
/// Must guarantee that at most one process holds the lock for a given key at
/// any instant, and that an unreleased lock is reclaimed automatically after
/// `expiry`.
#[async_trait]
pub trait DistributedLockFactory: Send + Sync {
    /// Try to acquire the lock for `key`.
    ///
    /// Returns `Ok(None)` when the lock is currently held elsewhere;
    /// contention is a normal outcome, not an error. Acquisition never
    /// blocks waiting for the current holder.
    async fn acquire(
        &self,
        key: &str,
        expiry: Duration,
    ) -> Result<Option<Box<dyn DistributedLock>>, DamperError>;
}

/// Release `lock`, downgrading failures to a warning.
///
/// Used after a dispatch decision has already been made: a failed release
/// must not override the outcome, and the token's expiry reclaims it anyway.
pub(crate) async fn release_or_warn(lock: Box<dyn DistributedLock>, key: &str) {
    if let Err(error) = lock.release().await {
        tracing::warn!(%key, %error, "failed to release dispatcher lock; expiry will reclaim it");
    }
}
