use std::{sync::Arc, time::Duration};

use crate::{
    DebounceDispatcher, DispatcherId, DistributedLockFactory, Settings, ThrottleDispatcher,
    TimestampStore,
};

/// Factory for distributed throttle and debounce dispatchers.
///
/// Binds a shared timestamp store, a distributed lock factory, and
/// [`Settings`] once, so call sites only name the dispatcher they want. The
/// factory has no coordination logic of its own.
///
/// # Examples
///
/// ```no_run
/// use std::{sync::Arc, time::Duration};
///
/// use damper::{Damper, DispatcherId, MemoryLockFactory, MemoryStore};
///
/// let damper = Damper::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(MemoryLockFactory::new()),
/// );
///
/// let throttle = damper.throttle(
///     DispatcherId::try_from("cache-refresh")?,
///     Duration::from_millis(500),
/// );
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let decision = throttle
///     .dispatch(|| async { Ok::<(), damper::BoxError>(()) })
///     .await?;
/// # Ok::<(), damper::DamperError>(())
/// # })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Damper {
    store: Arc<dyn TimestampStore>,
    locks: Arc<dyn DistributedLockFactory>,
    settings: Settings,
}

impl Damper {
    /// Create a factory with default [`Settings`].
    pub fn new(store: Arc<dyn TimestampStore>, locks: Arc<dyn DistributedLockFactory>) -> Self {
        Self::with_settings(store, locks, Settings::default())
    }

    /// Create a factory with explicit [`Settings`].
    pub fn with_settings(
        store: Arc<dyn TimestampStore>,
        locks: Arc<dyn DistributedLockFactory>,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            locks,
            settings,
        }
    }

    /// The settings shared by every dispatcher built from this factory.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Build a leading-edge throttle dispatcher.
    ///
    /// Dispatchers built with the same `id` and prefix coordinate across all
    /// processes sharing the backing store: at most one run per `interval`.
    pub fn throttle(&self, id: DispatcherId, interval: Duration) -> ThrottleDispatcher {
        ThrottleDispatcher::new(
            id,
            interval,
            Arc::clone(&self.store),
            Arc::clone(&self.locks),
            self.settings.clone(),
        )
    }

    /// Build a trailing-edge debounce dispatcher.
    ///
    /// The action runs once per burst, after triggers have been quiet for
    /// `interval`. When `max_delay` is set, the run happens no later than
    /// `max_delay` after the first trigger of the burst, even if triggers
    /// keep arriving.
    pub fn debounce(
        &self,
        id: DispatcherId,
        interval: Duration,
        max_delay: Option<Duration>,
    ) -> DebounceDispatcher {
        DebounceDispatcher::new(
            id,
            interval,
            max_delay,
            Arc::clone(&self.store),
            Arc::clone(&self.locks),
            self.settings.clone(),
        )
    }
}
