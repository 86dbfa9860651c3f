use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};

use crate::{DamperError, DistributedLock, DistributedLockFactory};

/// In-process [`DistributedLockFactory`] with expiry semantics.
///
/// Provides the same contract as the Redis lock within a single process:
/// at most one live lock per key, automatic reclamation after expiry, and
/// fenced release (a stale guard cannot evict a newer holder). Token
/// fencing mirrors the compare-on-release of the Redis implementation.
#[derive(Debug, Default)]
pub struct MemoryLockFactory {
    state: Arc<MemoryLockState>,
}

#[derive(Debug, Default)]
struct MemoryLockState {
    held: DashMap<String, HeldLock>,
    next_token: AtomicU64,
}

#[derive(Debug)]
struct HeldLock {
    token: u64,
    expires_at: Instant,
}

impl MemoryLockFactory {
    /// Create a factory with no locks held.
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn is_held(&self, key: &str) -> bool {
        self.state
            .held
            .get(key)
            .is_some_and(|held| held.expires_at > Instant::now())
    }
}

#[async_trait]
impl DistributedLockFactory for MemoryLockFactory {
    async fn acquire(
        &self,
        key: &str,
        expiry: Duration,
    ) -> Result<Option<Box<dyn DistributedLock>>, DamperError> {
        let token = self.state.next_token.fetch_add(1, Ordering::Relaxed);
        let held = HeldLock {
            token,
            expires_at: Instant::now() + expiry,
        };

        match self.state.held.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at > Instant::now() {
                    return Ok(None);
                }
                // Expired holder; reclaim in place.
                occupied.insert(held);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(held);
            }
        }

        Ok(Some(Box::new(MemoryLock {
            state: Arc::clone(&self.state),
            key: key.to_string(),
            token,
        })))
    } // end method acquire
}

struct MemoryLock {
    state: Arc<MemoryLockState>,
    key: String,
    token: u64,
}

#[async_trait]
impl DistributedLock for MemoryLock {
    async fn release(self: Box<Self>) -> Result<(), DamperError> {
        // Only the current holder may delete the entry; a guard that
        // outlived its expiry must not evict whoever re-acquired the key.
        self.state
            .held
            .remove_if(&self.key, |_, held| held.token == self.token);

        Ok(())
    }
}
