use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::{DamperError, DistributedLock, DistributedLockFactory};

/// [`DistributedLockFactory`] over a single shared Redis instance.
///
/// Acquisition is `SET key token NX PX expiry` with a random token; release
/// is an atomic compare-and-delete script, so a guard that outlived its
/// expiry cannot evict whoever re-acquired the key. Mutual exclusion holds
/// for all processes sharing this Redis instance; quorum locking across
/// independent instances is out of scope.
#[derive(Clone)]
pub struct RedisLockFactory {
    connection_manager: ConnectionManager,
}

impl RedisLockFactory {
    /// Create a lock factory over an established connection manager.
    pub fn new(connection_manager: ConnectionManager) -> Self {
        Self { connection_manager }
    }
}

#[async_trait]
impl DistributedLockFactory for RedisLockFactory {
    async fn acquire(
        &self,
        key: &str,
        expiry: Duration,
    ) -> Result<Option<Box<dyn DistributedLock>>, DamperError> {
        let token = uuid::Uuid::new_v4().to_string();
        let expiry_ms = u64::try_from(expiry.as_millis()).unwrap_or(u64::MAX).max(1);

        let mut connection_manager = self.connection_manager.clone();

        // SET .. NX returns OK when the key was set, nil when it is held.
        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(expiry_ms)
            .query_async(&mut connection_manager)
            .await?;

        let acquired = result.is_some();
        tracing::debug!(%key, acquired, "redis lock acquisition");

        if !acquired {
            return Ok(None);
        }

        Ok(Some(Box::new(RedisLock {
            connection_manager: self.connection_manager.clone(),
            key: key.to_string(),
            token,
        })))
    } // end method acquire
}

struct RedisLock {
    connection_manager: ConnectionManager,
    key: String,
    token: String,
}

#[async_trait]
impl DistributedLock for RedisLock {
    async fn release(self: Box<Self>) -> Result<(), DamperError> {
        // Check-and-delete must be atomic so a stale guard cannot delete a
        // newer holder's token.
        let script = redis::Script::new(
            r#"
            if redis.call("GET", KEYS[1]) == ARGV[1] then
                return redis.call("DEL", KEYS[1])
            end
            return 0
        "#,
        );

        let mut connection_manager = self.connection_manager.clone();

        let released: i64 = script
            .key(&self.key)
            .arg(&self.token)
            .invoke_async(&mut connection_manager)
            .await?;

        if released == 0 {
            tracing::debug!(key = %self.key, "redis lock already expired or rotated");
        }

        Ok(())
    }
}
