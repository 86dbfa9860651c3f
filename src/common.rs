use std::{
    fmt,
    ops::Deref,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::DamperError;

/// A validated dispatcher identity.
///
/// Dispatchers constructed with the same id (and prefix) coordinate with each
/// other across processes; uniqueness of the id is the caller's
/// responsibility, and collisions cause cross-talk between logically distinct
/// dispatchers.
///
/// Constraints:
/// - Must not be empty
/// - Must not be longer than 255 bytes
/// - Must not contain colons
#[derive(Debug, Clone, PartialEq, PartialOrd, Hash, Eq)]
pub struct DispatcherId(Arc<str>);

impl Deref for DispatcherId {
    type Target = Arc<str>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for DispatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DispatcherId {
    type Error = DamperError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err(DamperError::InvalidDispatcherId(
                "dispatcher id must not be empty".to_string(),
            ))
        } else if value.len() > 255 {
            Err(DamperError::InvalidDispatcherId(
                "dispatcher id must not be longer than 255 bytes".to_string(),
            ))
        } else if value.contains(":") {
            Err(DamperError::InvalidDispatcherId(
                "dispatcher id must not contain colons".to_string(),
            ))
        } else {
            Ok(Self(Arc::from(value)))
        }
    }
}

impl TryFrom<&str> for DispatcherId {
    type Error = DamperError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

/// A validated namespace prefix applied to every coordination key.
///
/// Same constraints as [`DispatcherId`].
#[derive(Debug, Clone, PartialEq, PartialOrd, Hash, Eq)]
pub struct KeyPrefix(Arc<str>);

impl KeyPrefix {
    /// The default prefix, `"damper"`.
    pub fn default_prefix() -> Self {
        Self(Arc::from("damper"))
    }
}

impl Deref for KeyPrefix {
    type Target = Arc<str>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<String> for KeyPrefix {
    type Error = DamperError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err(DamperError::InvalidKeyPrefix(
                "key prefix must not be empty".to_string(),
            ))
        } else if value.len() > 255 {
            Err(DamperError::InvalidKeyPrefix(
                "key prefix must not be longer than 255 bytes".to_string(),
            ))
        } else if value.contains(":") {
            Err(DamperError::InvalidKeyPrefix(
                "key prefix must not contain colons".to_string(),
            ))
        } else {
            Ok(Self(Arc::from(value)))
        }
    }
}

impl TryFrom<&str> for KeyPrefix {
    type Error = DamperError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

/// Shared configuration for all dispatchers built from one [`Damper`].
///
/// [`Damper`]: crate::Damper
#[derive(Clone, Debug)]
pub struct Settings {
    /// Namespace prefix for all coordination keys.
    pub key_prefix: KeyPrefix,
    /// Expiry for distributed lock tokens.
    ///
    /// Upper-bounds how long a crashed or partitioned holder can keep other
    /// processes out of a dispatcher's critical section. Defaults to 10
    /// seconds.
    pub lock_expiry: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_prefix: KeyPrefix::default_prefix(),
            lock_expiry: Duration::from_secs(10),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum DispatcherKind {
    Throttle,
    Debounce,
}

impl fmt::Display for DispatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatcherKind::Throttle => f.write_str("throttle"),
            DispatcherKind::Debounce => f.write_str("debounce"),
        }
    }
}

/// Namespaced coordination keys for one dispatcher identity.
#[derive(Clone, Debug)]
pub(crate) struct DispatcherKeys {
    /// Last-invoke (throttle) or last-attempt (debounce) timestamp.
    pub time: Arc<str>,
    /// First trigger of the current debounce window.
    pub init: Arc<str>,
    /// The distributed lock key.
    pub lock: Arc<str>,
}

impl DispatcherKeys {
    pub(crate) fn new(prefix: &KeyPrefix, kind: DispatcherKind, id: &DispatcherId) -> Self {
        let base = format!("{}:{}:{}", **prefix, kind, **id);

        Self {
            time: Arc::from(format!("{base}:time")),
            init: Arc::from(format!("{base}:init")),
            lock: Arc::from(format!("{base}:lock")),
        }
    }
}

/// Outcome of a dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchDecision {
    /// The action ran to completion during this call.
    Ran,
    /// The action did not run during this call.
    Skipped(SkipReason),
    /// The burst was handed to a delayed quiet-window check (debounce only).
    Scheduled,
}

/// Why a dispatch attempt did not run the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another process holds the coordination lock for this dispatcher.
    LockContended,
    /// The throttle interval has not elapsed since the last run.
    IntervalNotElapsed,
}

/// Wall-clock nanoseconds since the Unix epoch.
///
/// All instances coordinating on one dispatcher id must share a reasonably
/// synchronized clock; skew directly shifts interval decisions.
pub(crate) fn unix_nanos_now() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos()
}

/// Parse a stored timestamp; absence and malformed text both read as absent.
pub(crate) fn parse_nanos(value: Option<String>) -> Option<u128> {
    value.and_then(|v| v.parse::<u128>().ok())
}

/// Saturating distance between two epoch-nanos instants.
pub(crate) fn duration_since_nanos(earlier: u128, now: u128) -> Duration {
    let nanos = now.saturating_sub(earlier);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
