use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    BoxError, DamperError, DispatchDecision, DispatcherId, DistributedLockFactory, Settings,
    SkipReason, TimestampStore,
    common::{DispatcherKeys, DispatcherKind, duration_since_nanos, parse_nanos, unix_nanos_now},
    lock::release_or_warn,
};

/// Leading-edge rate limiter coordinated across processes.
///
/// The first trigger runs the action immediately; subsequent triggers are
/// dropped until `interval` has elapsed since the last run, no matter which
/// process performed it.
///
/// # Algorithm
///
/// 1. Acquire the dispatcher's distributed lock. Contention means another
///    process is handling this window: skip silently.
/// 2. Read the last-invoke timestamp; skip if `now - last < interval`.
/// 3. Otherwise write `now` as the new last-invoke timestamp, then run the
///    action.
/// 4. Release the lock on every exit path.
///
/// A failing action still consumes its throttle window: the timestamp is
/// written before the action runs, and there is no implicit retry.
pub struct ThrottleDispatcher {
    id: DispatcherId,
    interval: Duration,
    store: Arc<dyn TimestampStore>,
    locks: Arc<dyn DistributedLockFactory>,
    settings: Settings,
    keys: DispatcherKeys,
}

impl ThrottleDispatcher {
    pub(crate) fn new(
        id: DispatcherId,
        interval: Duration,
        store: Arc<dyn TimestampStore>,
        locks: Arc<dyn DistributedLockFactory>,
        settings: Settings,
    ) -> Self {
        let keys = DispatcherKeys::new(&settings.key_prefix, DispatcherKind::Throttle, &id);

        Self {
            id,
            interval,
            store,
            locks,
            settings,
            keys,
        }
    }

    /// This dispatcher's identity.
    pub fn id(&self) -> &DispatcherId {
        &self.id
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> &DispatcherKeys {
        &self.keys
    }

    /// Submit `action` for possible immediate execution.
    ///
    /// Returns once the decision and any execution complete. An error from
    /// the action surfaces as [`DamperError::Action`] after the lock has
    /// been released; losing the lock race returns
    /// [`DispatchDecision::Skipped`] and is not an error.
    pub async fn dispatch<F, Fut>(&self, action: F) -> Result<DispatchDecision, DamperError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), BoxError>>,
    {
        let Some(lock) = self
            .locks
            .acquire(&self.keys.lock, self.settings.lock_expiry)
            .await?
        else {
            tracing::debug!(dispatcher = %self.id, "throttle lock contended; skipping");
            return Ok(DispatchDecision::Skipped(SkipReason::LockContended));
        };

        let outcome = self.dispatch_locked(action).await;
        release_or_warn(lock, &self.keys.lock).await;

        outcome
    } // end method dispatch

    async fn dispatch_locked<F, Fut>(&self, action: F) -> Result<DispatchDecision, DamperError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), BoxError>>,
    {
        let now = unix_nanos_now();

        if let Some(last_invoke) = parse_nanos(self.store.get(&self.keys.time).await?)
            && duration_since_nanos(last_invoke, now) < self.interval
        {
            return Ok(DispatchDecision::Skipped(SkipReason::IntervalNotElapsed));
        }

        // Consume the window before running; a failing action does not get
        // an implicit retry.
        self.store.set(&self.keys.time, &now.to_string()).await?;

        action().await.map_err(DamperError::Action)?;

        Ok(DispatchDecision::Ran)
    }
}
