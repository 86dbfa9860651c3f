use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};

use crate::{DamperError, TimestampStore};

/// [`TimestampStore`] backed by a shared Redis database.
///
/// Uses [`redis::aio::ConnectionManager`] for pooling and automatic
/// reconnection; the manager is cloned per operation, so one store handle
/// can serve any number of dispatchers.
///
/// # Examples
///
/// ```ignore
/// let client = redis::Client::open("redis://127.0.0.1:6379/")?;
/// let connection_manager = client.get_connection_manager().await?;
/// let store = RedisStore::new(connection_manager);
/// ```
#[derive(Clone)]
pub struct RedisStore {
    connection_manager: ConnectionManager,
}

impl RedisStore {
    /// Create a store over an established connection manager.
    pub fn new(connection_manager: ConnectionManager) -> Self {
        Self { connection_manager }
    }
}

#[async_trait]
impl TimestampStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DamperError> {
        let mut connection_manager = self.connection_manager.clone();
        let value: Option<String> = connection_manager.get(key).await?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DamperError> {
        let mut connection_manager = self.connection_manager.clone();
        let _: () = connection_manager.set(key, value).await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DamperError> {
        let mut connection_manager = self.connection_manager.clone();
        let _: () = connection_manager.del(key).await?;

        Ok(())
    }
}
