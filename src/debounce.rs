use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    BoxError, DamperError, DispatchDecision, DispatcherId, DistributedLockFactory, Settings,
    SkipReason, TimestampStore,
    common::{DispatcherKeys, DispatcherKind, duration_since_nanos, parse_nanos, unix_nanos_now},
    lock::release_or_warn,
    runtime,
};

/// Trailing-edge rate limiter coordinated across processes.
///
/// The action runs at most once per burst of triggers, after the burst has
/// been quiet for `interval`. With `max_delay` set, the run happens no later
/// than `max_delay` after the first trigger of the burst, even while
/// triggers keep arriving.
///
/// # State machine
///
/// Per dispatcher identity, driven by triggers and kept in two store keys:
///
/// - Idle → window open: the first trigger of a burst writes the
///   first-trigger timestamp.
/// - Window open, retrigger: every trigger overwrites the last-attempt
///   timestamp. If the `max_delay` deadline has passed, the action runs
///   inline (deadline escape). Otherwise the trigger spawns a detached
///   re-check that fires after `min(interval, max_delay_remaining)`.
/// - Delayed re-check: re-acquires the lock, then runs the action if the
///   window has been quiet for `interval` or the deadline has been reached.
///   A newer trigger supersedes the check, which then exits without
///   running; its successor owns its own re-check.
/// - Window open → idle: whenever the action runs, both timestamps are
///   deleted and the next trigger starts a fresh burst.
///
/// Every decision above is made while holding the dispatcher's distributed
/// lock. A re-check that loses the lock race aborts silently and is not
/// retried; the burst then fires from a later trigger or re-check.
pub struct DebounceDispatcher {
    shared: Arc<DebounceShared>,
}

struct DebounceShared {
    id: DispatcherId,
    interval: Duration,
    max_delay: Option<Duration>,
    store: Arc<dyn TimestampStore>,
    locks: Arc<dyn DistributedLockFactory>,
    settings: Settings,
    keys: DispatcherKeys,
}

impl DebounceDispatcher {
    pub(crate) fn new(
        id: DispatcherId,
        interval: Duration,
        max_delay: Option<Duration>,
        store: Arc<dyn TimestampStore>,
        locks: Arc<dyn DistributedLockFactory>,
        settings: Settings,
    ) -> Self {
        let keys = DispatcherKeys::new(&settings.key_prefix, DispatcherKind::Debounce, &id);

        Self {
            shared: Arc::new(DebounceShared {
                id,
                interval,
                max_delay,
                store,
                locks,
                settings,
                keys,
            }),
        }
    }

    /// This dispatcher's identity.
    pub fn id(&self) -> &DispatcherId {
        &self.shared.id
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> &DispatcherKeys {
        &self.shared.keys
    }

    /// Submit `action` as one trigger of the current burst.
    ///
    /// Usually returns [`DispatchDecision::Scheduled`]: the burst is owned
    /// by a detached quiet-window check and this call is done. When the
    /// `max_delay` deadline has already passed the action runs inline and
    /// the call returns [`DispatchDecision::Ran`] (or
    /// [`DamperError::Action`] if it failed). Losing the lock race returns
    /// [`DispatchDecision::Skipped`]; another process is handling this
    /// trigger's window.
    ///
    /// An action handed to a detached check runs in the background; a
    /// failure there is reported through `tracing::error!` rather than to
    /// any caller.
    pub async fn dispatch<F, Fut>(&self, action: F) -> Result<DispatchDecision, DamperError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let shared = &self.shared;

        let Some(lock) = shared
            .locks
            .acquire(&shared.keys.lock, shared.settings.lock_expiry)
            .await?
        else {
            tracing::debug!(dispatcher = %shared.id, "debounce lock contended; skipping trigger");
            return Ok(DispatchDecision::Skipped(SkipReason::LockContended));
        };

        let outcome = Arc::clone(shared).trigger(action).await;
        release_or_warn(lock, &shared.keys.lock).await;

        outcome
    } // end method dispatch
}

impl DebounceShared {
    /// Handle one trigger while holding the dispatcher lock.
    async fn trigger<F, Fut>(self: Arc<Self>, action: F) -> Result<DispatchDecision, DamperError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let now = unix_nanos_now();

        // Mark the latest attempt first; delayed re-checks compare against it.
        self.store.set(&self.keys.time, &now.to_string()).await?;

        let first_trigger = match parse_nanos(self.store.get(&self.keys.init).await?) {
            Some(first_trigger) => first_trigger,
            None => {
                self.store.set(&self.keys.init, &now.to_string()).await?;
                now
            }
        };

        let since_first = duration_since_nanos(first_trigger, now);

        if let Some(max_delay) = self.max_delay
            && since_first > max_delay
        {
            // Deadline escape: the burst has been open too long already.
            self.invoke(action).await?;
            return Ok(DispatchDecision::Ran);
        }

        let delay = match self.max_delay {
            Some(max_delay) => max_delay.saturating_sub(since_first).min(self.interval),
            None => self.interval,
        };

        let shared = Arc::clone(&self);
        runtime::spawn_task(async move {
            if let Err(error) = shared.recheck_after(action, delay).await {
                tracing::error!(dispatcher = %shared.id, %error, "delayed debounce check failed");
            }
        });

        Ok(DispatchDecision::Scheduled)
    } // end method trigger

    /// Wait out `delay`, then run the action if the window is ready.
    async fn recheck_after<F, Fut>(&self, action: F, delay: Duration) -> Result<(), DamperError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<(), BoxError>> + Send,
    {
        runtime::sleep(delay).await;

        let Some(lock) = self
            .locks
            .acquire(&self.keys.lock, self.settings.lock_expiry)
            .await?
        else {
            // Another process owns this window; its own checks decide when
            // the burst fires. No retry here.
            tracing::debug!(dispatcher = %self.id, "debounce re-check lost the lock race");
            return Ok(());
        };

        let outcome = self.recheck_locked(action).await;
        release_or_warn(lock, &self.keys.lock).await;

        outcome
    }

    async fn recheck_locked<F, Fut>(&self, action: F) -> Result<(), DamperError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<(), BoxError>> + Send,
    {
        let now = unix_nanos_now();

        let Some(last_attempt) = parse_nanos(self.store.get(&self.keys.time).await?) else {
            // The window already closed; nothing left for this check.
            return Ok(());
        };

        if duration_since_nanos(last_attempt, now) >= self.interval {
            return self.invoke(action).await;
        }

        // The quiet window was not met; if a deadline is configured and this
        // check landed on it, the burst must still fire now rather than wait
        // for a trigger that may never come.
        if let Some(max_delay) = self.max_delay
            && let Some(first_trigger) = parse_nanos(self.store.get(&self.keys.init).await?)
            && duration_since_nanos(first_trigger, now) >= max_delay
        {
            return self.invoke(action).await;
        }

        // Superseded by a newer trigger, which owns its own re-check.
        Ok(())
    }

    /// Run the action and reset the window to idle.
    ///
    /// The timestamps are deleted even when the action fails; the burst is
    /// consumed either way, and the action's error takes precedence over any
    /// cleanup error.
    async fn invoke<F, Fut>(&self, action: F) -> Result<(), DamperError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), BoxError>>,
    {
        let outcome = action().await;

        let time_deleted = self.store.delete(&self.keys.time).await;
        let init_deleted = self.store.delete(&self.keys.init).await;

        outcome.map_err(DamperError::Action)?;
        time_deleted?;
        init_deleted?;

        Ok(())
    } // end method invoke
}
